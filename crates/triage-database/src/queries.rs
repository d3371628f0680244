//! 表结构管理

use crate::connection::DatabasePool;
use triage_core::Result;

/// 建表语句，按外键依赖顺序执行
const TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS hospitals (
        id UUID PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        address TEXT,
        phone VARCHAR(64),
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS doctors (
        id UUID PRIMARY KEY,
        hospital_id UUID NOT NULL REFERENCES hospitals(id),
        name VARCHAR(255) NOT NULL,
        specialization VARCHAR(255),
        available BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS receipts (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        image_url TEXT NOT NULL,
        uploaded_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        processed_at TIMESTAMP WITH TIME ZONE,
        condition TEXT,
        severity INTEGER,
        hospital_id UUID REFERENCES hospitals(id),
        doctor_id UUID REFERENCES doctors(id),
        status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
        queue_position INTEGER,
        ai_analysis TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS appointments (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        hospital_id UUID NOT NULL REFERENCES hospitals(id),
        doctor_id UUID REFERENCES doctors(id),
        status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
        preferred_date TIMESTAMP WITH TIME ZONE NOT NULL,
        scheduled_date TIMESTAMP WITH TIME ZONE,
        reason TEXT,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS emergency_alerts (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        hospital_id UUID NOT NULL REFERENCES hospitals(id),
        status VARCHAR(20) NOT NULL DEFAULT 'PENDING',
        patient_info JSONB NOT NULL DEFAULT '{}'::jsonb,
        medical_history JSONB,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        responded_at TIMESTAMP WITH TIME ZONE
    )
    "#,
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_doctors_hospital_id ON doctors(hospital_id)",
    "CREATE INDEX IF NOT EXISTS idx_receipts_user_id ON receipts(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_receipts_hospital_status ON receipts(hospital_id, status)",
    // 同一医院排队中的位置唯一
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_receipts_queue_slot ON receipts(hospital_id, queue_position) WHERE status = 'QUEUED'",
    "CREATE INDEX IF NOT EXISTS idx_appointments_hospital_status ON appointments(hospital_id, status)",
    "CREATE INDEX IF NOT EXISTS idx_appointments_preferred_date ON appointments(preferred_date)",
    "CREATE INDEX IF NOT EXISTS idx_alerts_hospital_status ON emergency_alerts(hospital_id, status)",
];

/// 数据库表结构操作
pub struct DatabaseQueries<'a> {
    pool: &'a DatabasePool,
}

impl<'a> DatabaseQueries<'a> {
    pub fn new(pool: &'a DatabasePool) -> Self {
        Self { pool }
    }

    /// 创建数据库表
    pub async fn create_tables(&self) -> Result<()> {
        let pool = self.pool.pool();

        for table_sql in TABLES {
            sqlx::query(table_sql).execute(pool).await?;
        }

        self.create_indexes().await?;

        tracing::info!("Database tables created successfully");
        Ok(())
    }

    /// 创建数据库索引
    async fn create_indexes(&self) -> Result<()> {
        let pool = self.pool.pool();

        for index_sql in INDEXES {
            sqlx::query(index_sql).execute(pool).await?;
        }

        tracing::info!("Database indexes created successfully");
        Ok(())
    }
}
