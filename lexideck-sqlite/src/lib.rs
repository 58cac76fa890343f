use chrono::{DateTime, SecondsFormat, Utc};
use lexideck_core::{repo::Repository, Card, CoreError, Grade, NewCard, Page, PageQuery, ReviewRecord};
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::path::Path;

pub struct SqliteRepo {
    pool: SqlitePool,
}

const CARD_COLUMNS: &str =
    "id,phrase,meaning,example,categories,grades,last_reviewed_at,created_at";

impl SqliteRepo {
    pub async fn open_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let url = format!("sqlite://{}?mode=rwc", path.as_ref().to_string_lossy());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    /// Every pooled connection to `:memory:` is its own database, so keep one.
    pub async fn open_memory() -> Result<Self, CoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|_| CoreError::Storage("sqlite connect"))?;
        let repo = Self { pool };
        repo.ensure_schema().await?;
        Ok(repo)
    }

    async fn ensure_schema(&self) -> Result<(), CoreError> {
        const STMT: &str = r#"
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS cards (
          id                TEXT PRIMARY KEY,
          phrase            TEXT NOT NULL,
          meaning           TEXT NOT NULL,
          example           TEXT,
          categories        TEXT NOT NULL,
          grades            TEXT NOT NULL,
          last_reviewed_at  TEXT,
          created_at        TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reviews (
          card_id      TEXT NOT NULL,
          grade        TEXT NOT NULL,
          reviewed_at  TEXT NOT NULL,
          FOREIGN KEY(card_id) REFERENCES cards(id) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS idx_cards_order ON cards (created_at, id);
        CREATE INDEX IF NOT EXISTS idx_reviews_card_time ON reviews (card_id, reviewed_at);
        "#;

        // Execute statements one by one for compatibility.
        for chunk in STMT.split(';') {
            let sql = chunk.trim();
            if sql.is_empty() {
                continue;
            }
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|_| CoreError::Storage("sqlite schema"))?;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl Repository for SqliteRepo {
    // ===== Cards =====
    async fn add_card(&self, new: NewCard) -> Result<Card, CoreError> {
        if new.phrase.trim().is_empty() {
            return Err(CoreError::Invalid("empty phrase"));
        }
        let card = new.into_card();

        sqlx::query(
            r#"
            INSERT INTO cards (id, phrase, meaning, example, categories, grades, last_reviewed_at, created_at)
            VALUES (?,?,?,?,?,?,?,?)
            "#,
        )
        .bind(&card.id)
        .bind(&card.phrase)
        .bind(&card.meaning)
        .bind(card.example.clone())
        .bind(to_json(&card.categories)?)
        .bind(to_json(&card.grades)?)
        .bind(card.last_reviewed_at.map(dt_to_str))
        .bind(dt_to_str(card.created_at))
        .execute(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("insert card"))?;

        Ok(card)
    }

    async fn get_card(&self, id: &str) -> Result<Card, CoreError> {
        let row = sqlx::query(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id=?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|_| CoreError::Storage("read card"))?;
        let row = row.ok_or(CoreError::NotFound("card"))?;
        row_into_card(row)
    }

    async fn list_cards(&self) -> Result<Vec<Card>, CoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {CARD_COLUMNS} FROM cards ORDER BY created_at ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list cards"))?;
        rows.into_iter().map(row_into_card).collect()
    }

    async fn delete_card(&self, id: &str) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;
        sqlx::query("DELETE FROM reviews WHERE card_id=?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del reviews"))?;
        let res = sqlx::query("DELETE FROM cards WHERE id=?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("del card"))?;
        if res.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(CoreError::NotFound("card"));
        }
        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))
    }

    async fn page_cards(&self, query: &PageQuery) -> Result<Page, CoreError> {
        let offset = query.offset()?;
        let limit = query.effective_limit();
        // One extra row tells us whether another page exists.
        let fetch = i64::try_from(limit + 1).map_err(|_| CoreError::Invalid("page size"))?;
        let skip = i64::try_from(offset).map_err(|_| CoreError::Invalid("cursor"))?;

        let rows = match &query.category {
            Some(cat) => sqlx::query(&format!(
                r#"SELECT {CARD_COLUMNS} FROM cards
                   WHERE EXISTS (SELECT 1 FROM json_each(cards.categories) WHERE lower(json_each.value)=lower(?))
                   ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?"#
            ))
            .bind(cat.trim())
            .bind(fetch)
            .bind(skip)
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query(&format!(
                "SELECT {CARD_COLUMNS} FROM cards ORDER BY created_at ASC, id ASC LIMIT ? OFFSET ?"
            ))
            .bind(fetch)
            .bind(skip)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(|_| CoreError::Storage("page cards"))?;

        let mut cards = rows
            .into_iter()
            .map(row_into_card)
            .collect::<Result<Vec<_>, _>>()?;
        let next_cursor = if cards.len() > limit {
            cards.truncate(limit);
            Some((offset + limit).to_string())
        } else {
            None
        };
        Ok(Page { cards, next_cursor })
    }

    // ===== Reviews =====
    async fn record_review(&self, review: &ReviewRecord) -> Result<(), CoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|_| CoreError::Storage("tx"))?;

        let row = sqlx::query("SELECT grades FROM cards WHERE id=?")
            .bind(&review.card_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("read card"))?
            .ok_or(CoreError::NotFound("card"))?;
        let mut grades: Vec<Grade> = serde_json::from_str(&row.get::<String, _>("grades"))
            .map_err(|_| CoreError::Invalid("grades"))?;
        grades.push(review.grade);

        sqlx::query("UPDATE cards SET grades=?, last_reviewed_at=? WHERE id=?")
            .bind(to_json(&grades)?)
            .bind(dt_to_str(review.reviewed_at))
            .bind(&review.card_id)
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("update card"))?;

        sqlx::query("INSERT INTO reviews (card_id,grade,reviewed_at) VALUES (?,?,?)")
            .bind(&review.card_id)
            .bind(review.grade.as_str())
            .bind(dt_to_str(review.reviewed_at))
            .execute(&mut *tx)
            .await
            .map_err(|_| CoreError::Storage("insert review"))?;

        tx.commit()
            .await
            .map_err(|_| CoreError::Storage("tx commit"))
    }

    async fn list_reviews_for_card(&self, card_id: &str) -> Result<Vec<ReviewRecord>, CoreError> {
        let rows = sqlx::query(
            r#"SELECT card_id,grade,reviewed_at
               FROM reviews WHERE card_id=? ORDER BY reviewed_at ASC"#,
        )
        .bind(card_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|_| CoreError::Storage("list reviews"))?;
        let mut v = Vec::with_capacity(rows.len());
        for row in rows {
            v.push(ReviewRecord {
                card_id: row.get::<String, _>("card_id"),
                grade: Grade::parse(&row.get::<String, _>("grade"))
                    .ok_or(CoreError::Invalid("grade"))?,
                reviewed_at: dt_from_str(row.get::<String, _>("reviewed_at"))?,
            });
        }
        Ok(v)
    }
}

// ===== Helpers =====
// Fixed-width so that text ordering in SQL matches time ordering.
fn dt_to_str(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn dt_from_str(s: String) -> Result<DateTime<Utc>, CoreError> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map_err(|_| CoreError::Invalid("datetime"))
        .map(|dt| dt.with_timezone(&Utc))
}

fn to_json<T: serde::Serialize + ?Sized>(v: &T) -> Result<String, CoreError> {
    serde_json::to_string(v).map_err(|_| CoreError::Invalid("json column"))
}

fn row_into_card(row: sqlx::sqlite::SqliteRow) -> Result<Card, CoreError> {
    let categories: Vec<String> = serde_json::from_str(&row.get::<String, _>("categories"))
        .map_err(|_| CoreError::Invalid("categories"))?;
    let grades: Vec<Grade> =
        serde_json::from_str(&row.get::<String, _>("grades")).map_err(|_| CoreError::Invalid("grades"))?;

    Ok(Card {
        id: row.get::<String, _>("id"),
        phrase: row.get::<String, _>("phrase"),
        meaning: row.get::<String, _>("meaning"),
        example: row.get::<Option<String>, _>("example"),
        categories,
        grades,
        last_reviewed_at: row
            .get::<Option<String>, _>("last_reviewed_at")
            .map(dt_from_str)
            .transpose()?,
        created_at: dt_from_str(row.get::<String, _>("created_at"))?,
    })
}
