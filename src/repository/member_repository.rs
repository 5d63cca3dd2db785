use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{DeletionSummary, ImportCounts, Member},
    error::{is_unique_violation, AppError, Result},
    repository::MemberRepository,
};

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct MemberRow {
    id: String,
    name: String,
    phone: Option<String>,
    emergency_contact_name: Option<String>,
    emergency_contact_phone: Option<String>,
    birth_date: Option<NaiveDate>,
    dues_plan: String,
    medical_notes: Option<String>,
    comments: Option<String>,
    photo: Option<Vec<u8>>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const MEMBER_COLUMNS: &str = r#"
    id, name, phone, emergency_contact_name, emergency_contact_phone,
    birth_date, dues_plan, medical_notes, comments, photo,
    created_at, updated_at
"#;

pub struct SqliteMemberRepository {
    pool: SqlitePool,
}

impl SqliteMemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_member(row: MemberRow) -> Member {
        Member {
            id: row.id,
            name: row.name,
            phone: row.phone,
            emergency_contact_name: row.emergency_contact_name,
            emergency_contact_phone: row.emergency_contact_phone,
            birth_date: row.birth_date,
            dues_plan: row.dues_plan,
            medical_notes: row.medical_notes,
            comments: row.comments,
            photo: row.photo,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        }
    }
}

#[async_trait]
impl MemberRepository for SqliteMemberRepository {
    async fn create(&self, member: &Member) -> Result<Member> {
        sqlx::query(
            r#"
            INSERT INTO members (
                id, name, phone, emergency_contact_name, emergency_contact_phone,
                birth_date, dues_plan, medical_notes, comments, photo,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.phone)
        .bind(&member.emergency_contact_name)
        .bind(&member.emergency_contact_phone)
        .bind(member.birth_date)
        .bind(&member.dues_plan)
        .bind(&member.medical_notes)
        .bind(&member.comments)
        .bind(&member.photo)
        .bind(member.created_at.naive_utc())
        .bind(member.updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateId(member.id.clone())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        self.find_by_id(&member.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created member".to_string())
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Member>> {
        let row = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members WHERE id = ?",
            MEMBER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::row_to_member))
    }

    async fn list(&self) -> Result<Vec<Member>> {
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            "SELECT {} FROM members ORDER BY name COLLATE NOCASE, id",
            MEMBER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_member).collect())
    }

    async fn search(&self, query: &str) -> Result<Vec<Member>> {
        let pattern = format!("%{}%", query.trim().to_lowercase());
        let rows = sqlx::query_as::<_, MemberRow>(&format!(
            r#"
            SELECT {} FROM members
            WHERE lower(name) LIKE ? OR id LIKE ?
            ORDER BY name COLLATE NOCASE, id
            "#,
            MEMBER_COLUMNS
        ))
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::row_to_member).collect())
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn count_by_plan(&self, plan_name: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE dues_plan = ?")
            .bind(plan_name)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn update(&self, current_id: &str, member: &Member) -> Result<Member> {
        let mut tx = self.pool.begin().await?;

        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE id = ?")
            .bind(current_id)
            .fetch_one(&mut *tx)
            .await?;
        if exists == 0 {
            return Err(AppError::NotFound(format!("Member {} not found", current_id)));
        }

        let renaming = member.id != current_id;
        if renaming {
            let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE id = ?")
                .bind(&member.id)
                .fetch_one(&mut *tx)
                .await?;
            if taken > 0 {
                return Err(AppError::DuplicateId(member.id.clone()));
            }
        }

        sqlx::query(
            r#"
            UPDATE members
            SET id = ?,
                name = ?,
                phone = ?,
                emergency_contact_name = ?,
                emergency_contact_phone = ?,
                birth_date = ?,
                dues_plan = ?,
                medical_notes = ?,
                comments = ?,
                photo = ?,
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&member.id)
        .bind(&member.name)
        .bind(&member.phone)
        .bind(&member.emergency_contact_name)
        .bind(&member.emergency_contact_phone)
        .bind(member.birth_date)
        .bind(&member.dues_plan)
        .bind(&member.medical_notes)
        .bind(&member.comments)
        .bind(&member.photo)
        .bind(member.updated_at.naive_utc())
        .bind(current_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateId(member.id.clone())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        if renaming {
            // Normally a no-op after ON UPDATE CASCADE; covers connections
            // opened with foreign keys disabled.
            let moved = sqlx::query("UPDATE payments SET member_id = ? WHERE member_id = ?")
                .bind(&member.id)
                .bind(current_id)
                .execute(&mut *tx)
                .await?
                .rows_affected();

            tracing::debug!(
                old_id = %current_id,
                new_id = %member.id,
                explicitly_moved = moved,
                "Moved payments to renamed member"
            );
        }

        tx.commit().await?;

        self.find_by_id(&member.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated member".to_string())
        })
    }

    async fn delete(&self, id: &str) -> Result<DeletionSummary> {
        let mut tx = self.pool.begin().await?;

        let name: Option<String> = sqlx::query_scalar("SELECT name FROM members WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let name = name.ok_or_else(|| AppError::NotFound(format!("Member {} not found", id)))?;

        let payments_deleted = sqlx::query("DELETE FROM payments WHERE member_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM members WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(DeletionSummary {
            member_id: id.to_string(),
            member_name: name,
            payments_deleted,
        })
    }

    async fn import(&self, members: &[Member]) -> Result<ImportCounts> {
        let mut tx = self.pool.begin().await?;
        let mut counts = ImportCounts::default();

        for member in members {
            let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE id = ?")
                .bind(&member.id)
                .fetch_one(&mut *tx)
                .await?;

            if exists > 0 {
                sqlx::query(
                    r#"
                    UPDATE members
                    SET name = ?,
                        phone = ?,
                        emergency_contact_name = ?,
                        emergency_contact_phone = ?,
                        birth_date = ?,
                        dues_plan = ?,
                        medical_notes = ?,
                        comments = ?,
                        updated_at = ?
                    WHERE id = ?
                    "#
                )
                .bind(&member.name)
                .bind(&member.phone)
                .bind(&member.emergency_contact_name)
                .bind(&member.emergency_contact_phone)
                .bind(member.birth_date)
                .bind(&member.dues_plan)
                .bind(&member.medical_notes)
                .bind(&member.comments)
                .bind(member.updated_at.naive_utc())
                .bind(&member.id)
                .execute(&mut *tx)
                .await?;
                counts.updated += 1;
            } else {
                sqlx::query(
                    r#"
                    INSERT INTO members (
                        id, name, phone, emergency_contact_name, emergency_contact_phone,
                        birth_date, dues_plan, medical_notes, comments, photo,
                        created_at, updated_at
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                    "#
                )
                .bind(&member.id)
                .bind(&member.name)
                .bind(&member.phone)
                .bind(&member.emergency_contact_name)
                .bind(&member.emergency_contact_phone)
                .bind(member.birth_date)
                .bind(&member.dues_plan)
                .bind(&member.medical_notes)
                .bind(&member.comments)
                .bind(&member.photo)
                .bind(member.created_at.naive_utc())
                .bind(member.updated_at.naive_utc())
                .execute(&mut *tx)
                .await?;
                counts.created += 1;
            }
        }

        // Dropping the transaction on any error above rolls every row back
        tx.commit().await?;
        Ok(counts)
    }
}
