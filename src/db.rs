use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

pub async fn create_pool(config: &Config) -> PgPool {
    let url = config.database_url();
    PgPoolOptions::new()
        .min_connections(config.db.pool_min)
        .max_connections(config.db.pool_max)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(&url)
        .await
        .expect("Failed to connect to PostgreSQL")
}

/// Idempotent schema bootstrap, run once at startup.
pub async fn init_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let statements = [
        r#"CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email VARCHAR(255) UNIQUE NOT NULL,
            password_hash VARCHAR(255) NOT NULL,
            first_name VARCHAR(100) NOT NULL,
            last_name VARCHAR(100) NOT NULL,
            phone VARCHAR(20),
            role VARCHAR(50) NOT NULL DEFAULT 'member',
            status VARCHAR(50) NOT NULL DEFAULT 'active',
            verified BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS verification_codes (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID REFERENCES users(id) ON DELETE CASCADE,
            code VARCHAR(6) NOT NULL,
            expires_at TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS password_resets (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID REFERENCES users(id) ON DELETE CASCADE,
            token VARCHAR(255) NOT NULL UNIQUE,
            expires_at TIMESTAMPTZ NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS organizations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            church_name VARCHAR(200) NOT NULL,
            legal_name VARCHAR(200),
            logo_url VARCHAR(255),
            structure VARCHAR(50) NOT NULL DEFAULT 'single',
            currency VARCHAR(10) NOT NULL DEFAULT 'USD',
            payment_gateway VARCHAR(50),
            admin_id UUID REFERENCES users(id),
            subscription_id UUID,
            onboarding_complete BOOLEAN NOT NULL DEFAULT false,
            onboarding_step INTEGER NOT NULL DEFAULT 1,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS branches (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            name VARCHAR(200) NOT NULL,
            address TEXT,
            city VARCHAR(100),
            state VARCHAR(100),
            zip_code VARCHAR(20),
            latitude DOUBLE PRECISION,
            longitude DOUBLE PRECISION,
            geofence_radius INTEGER NOT NULL DEFAULT 100,
            is_head_office BOOLEAN NOT NULL DEFAULT false,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS fund_buckets (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
            name VARCHAR(150) NOT NULL,
            description TEXT,
            enabled BOOLEAN NOT NULL DEFAULT true,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS members (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            date_of_birth DATE,
            gender VARCHAR(20),
            marital_status VARCHAR(50),
            address TEXT,
            city VARCHAR(100),
            state VARCHAR(100),
            zip_code VARCHAR(20),
            country VARCHAR(100),
            baptism_date DATE,
            membership_date DATE,
            member_status VARCHAR(50) NOT NULL DEFAULT 'active',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS events (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            title VARCHAR(200) NOT NULL,
            description TEXT,
            event_type VARCHAR(100),
            start_date TIMESTAMPTZ NOT NULL,
            end_date TIMESTAMPTZ NOT NULL,
            location VARCHAR(255),
            organizer_id UUID REFERENCES users(id),
            max_capacity INTEGER,
            status VARCHAR(50) NOT NULL DEFAULT 'scheduled',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS event_registrations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            event_id UUID NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            registration_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            status VARCHAR(50) NOT NULL DEFAULT 'registered',
            UNIQUE (event_id, user_id)
        )"#,
        r#"CREATE TABLE IF NOT EXISTS donations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            donor_id UUID REFERENCES users(id),
            amount DOUBLE PRECISION NOT NULL,
            donation_type VARCHAR(100),
            donation_date TIMESTAMPTZ NOT NULL,
            payment_method VARCHAR(50),
            transaction_id VARCHAR(100),
            notes TEXT,
            fund_bucket_id UUID REFERENCES fund_buckets(id),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        r#"CREATE TABLE IF NOT EXISTS subscriptions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            organization_id UUID UNIQUE NOT NULL REFERENCES organizations(id),
            plan_id VARCHAR(50) NOT NULL,
            status VARCHAR(50) NOT NULL DEFAULT 'active',
            billing_cycle VARCHAR(50) NOT NULL DEFAULT 'monthly',
            current_period_start TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            current_period_end TIMESTAMPTZ NOT NULL,
            cancel_at_period_end BOOLEAN NOT NULL DEFAULT false,
            cancelled_at TIMESTAMPTZ,
            payment_method VARCHAR(50),
            payment_details JSONB,
            billing_address JSONB,
            members_count INTEGER NOT NULL DEFAULT 0,
            branches_count INTEGER NOT NULL DEFAULT 0,
            sms_used INTEGER NOT NULL DEFAULT 0,
            donation_transactions INTEGER NOT NULL DEFAULT 0,
            last_reset_date TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            price_amount BIGINT,
            price_currency VARCHAR(10) NOT NULL DEFAULT 'GHS',
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )"#,
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_status ON subscriptions (status)",
        "CREATE INDEX IF NOT EXISTS idx_subscriptions_period_end ON subscriptions (current_period_end)",
        "CREATE INDEX IF NOT EXISTS idx_organizations_admin ON organizations (admin_id)",
        "CREATE INDEX IF NOT EXISTS idx_verification_codes_user ON verification_codes (user_id)",
        "CREATE INDEX IF NOT EXISTS idx_donations_date ON donations (donation_date)",
    ];

    for stmt in statements {
        sqlx::query(stmt).execute(pool).await?;
    }
    Ok(())
}
