use std::path::Path;

use chrono::{SecondsFormat, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool, sqlite::SqliteConnectOptions, sqlite::SqliteRow};
use uuid::Uuid;

use crate::error::AppError;

use super::models::{Profile, ProfileInput, ProfileQuery, ProfileSort, TEXT_COLUMNS};

const SELECT_COLUMNS: &str = "id, username, profession, skills, hourly_rate, bio, photo, \
     github, instagram, tiktok, linkedin, whatsapp, \
     portfolio1, portfolio2, portfolio3, portfolio4, portfolio5, \
     is_public, created_at, updated_at";

/// 参与模糊搜索的列
const SEARCH_COLUMNS: [&str; 4] = ["username", "bio", "skills", "profession"];

/// 新建记录的结果
#[derive(Debug, Clone)]
pub struct CreatedProfile {
    pub id: i64,
    pub delete_code: String,
}

#[derive(Clone)]
pub struct ProfileStorage {
    pub pool: SqlitePool,
}

fn now_rfc3339() -> String {
    // 固定微秒精度，保证按文本排序与按时间排序一致
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 转义 LIKE 通配符，搜索词按字面匹配
fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

pub const USERNAME_TAKEN: &str = "Username already exists";

/// 写入时撞上 username 唯一约束按冲突处理，其余仍是内部错误
fn map_write_error(err: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return AppError::Conflict(USERNAME_TAKEN.to_string());
    }
    AppError::from(err)
}

fn row_to_profile(row: &SqliteRow) -> Result<Profile, sqlx::Error> {
    Ok(Profile {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        profession: row.try_get("profession")?,
        skills: row.try_get("skills")?,
        hourly_rate: row.try_get("hourly_rate")?,
        bio: row.try_get("bio")?,
        photo: row.try_get("photo")?,
        github: row.try_get("github")?,
        instagram: row.try_get("instagram")?,
        tiktok: row.try_get("tiktok")?,
        linkedin: row.try_get("linkedin")?,
        whatsapp: row.try_get("whatsapp")?,
        portfolio1: row.try_get("portfolio1")?,
        portfolio2: row.try_get("portfolio2")?,
        portfolio3: row.try_get("portfolio3")?,
        portfolio4: row.try_get("portfolio4")?,
        portfolio5: row.try_get("portfolio5")?,
        is_public: row.try_get("is_public")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

impl ProfileStorage {
    pub async fn connect_sqlite(path: &str, wal: bool) -> Result<Self, AppError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .map_err(|e| AppError::Internal(format!("创建数据库目录失败: {e}")))?;
        }
        let opt = SqliteConnectOptions::new()
            .filename(Path::new(path))
            .create_if_missing(true);
        let pool = SqlitePool::connect_with(opt)
            .await
            .map_err(|e| AppError::Internal(format!("sqlite connect: {e}")))?;
        if wal {
            sqlx::query("PRAGMA journal_mode=WAL;")
                .execute(&pool)
                .await
                .ok();
        }
        sqlx::query("PRAGMA synchronous=NORMAL;")
            .execute(&pool)
            .await
            .ok();
        Ok(Self { pool })
    }

    pub async fn init_schema(&self) -> Result<(), AppError> {
        let ddl = r#"
        CREATE TABLE IF NOT EXISTS profiles (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            profession TEXT,
            skills TEXT,
            hourly_rate REAL,
            bio TEXT,
            photo TEXT,
            github TEXT,
            instagram TEXT,
            tiktok TEXT,
            linkedin TEXT,
            whatsapp TEXT,
            portfolio1 TEXT,
            portfolio2 TEXT,
            portfolio3 TEXT,
            portfolio4 TEXT,
            portfolio5 TEXT,
            is_public INTEGER NOT NULL DEFAULT 1,
            delete_code TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_profiles_public_created ON profiles(is_public, created_at);
        CREATE INDEX IF NOT EXISTS idx_profiles_profession ON profiles(profession);
        "#;
        sqlx::query(ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("init schema: {e}")))?;
        Ok(())
    }

    /// 列出公开名片，支持搜索、职业筛选与排序
    pub async fn list_public(&self, query: &ProfileQuery) -> Result<Vec<Profile>, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {SELECT_COLUMNS} FROM profiles WHERE is_public = 1"
        ));

        if let Some(search) = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            // SQLite 的 LIKE 只对 ASCII 字母忽略大小写
            let pattern = format!("%{}%", escape_like(search));
            qb.push(" AND (");
            for (i, col) in SEARCH_COLUMNS.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(format!("{col} LIKE "))
                    .push_bind(pattern.clone())
                    .push(" ESCAPE '\\'");
            }
            qb.push(")");
        }

        if let Some(profession) = query
            .profession
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            qb.push(" AND profession = ").push_bind(profession.to_string());
        }

        qb.push(ProfileSort::parse(query.sort.as_deref()).order_clause());

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| row_to_profile(r).map_err(AppError::from))
            .collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<Profile>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {SELECT_COLUMNS} FROM profiles WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref()
            .map(row_to_profile)
            .transpose()
            .map_err(AppError::from)
    }

    /// 快速路径；唯一性最终由表约束保证
    pub async fn username_exists(&self, username: &str) -> Result<bool, AppError> {
        let row = sqlx::query("SELECT 1 FROM profiles WHERE username = ? LIMIT 1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// 新建名片。`username` 由调用方校验；未提供 delete_code 时生成 UUID v4。
    pub async fn create(
        &self,
        username: &str,
        input: &ProfileInput,
    ) -> Result<CreatedProfile, AppError> {
        let now = now_rfc3339();
        let delete_code = input
            .delete_code
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut qb = QueryBuilder::<Sqlite>::new(
            "INSERT INTO profiles (username, hourly_rate, is_public, delete_code, created_at, updated_at",
        );
        for col in TEXT_COLUMNS {
            qb.push(", ").push(col);
        }
        qb.push(") VALUES (");
        {
            let mut values = qb.separated(", ");
            values.push_bind(username.to_string());
            values.push_bind(input.hourly_rate.flatten());
            values.push_bind(input.is_public.unwrap_or(true));
            values.push_bind(delete_code.clone());
            values.push_bind(now.clone());
            values.push_bind(now);
            for field in input.text_fields() {
                values.push_bind(field.clone().flatten());
            }
        }
        qb.push(")");

        let res = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(CreatedProfile {
            id: res.last_insert_rowid(),
            delete_code,
        })
    }

    /// 只更新请求体中出现的字段；返回记录是否存在。
    pub async fn update(&self, id: i64, input: &ProfileInput) -> Result<bool, AppError> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE profiles SET updated_at = ");
        qb.push_bind(now_rfc3339());

        if let Some(username) = &input.username {
            qb.push(", username = ").push_bind(username.clone());
        }
        if let Some(rate) = input.hourly_rate {
            qb.push(", hourly_rate = ").push_bind(rate);
        }
        if let Some(is_public) = input.is_public {
            qb.push(", is_public = ").push_bind(is_public);
        }
        for (col, field) in TEXT_COLUMNS.iter().zip(input.text_fields()) {
            if let Some(value) = field {
                qb.push(format!(", {col} = ")).push_bind(value.clone());
            }
        }
        qb.push(" WHERE id = ").push_bind(id);

        let res = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(res.rows_affected() > 0)
    }

    /// 删除名片；返回记录是否存在。
    pub async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let res = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
