use std::env;

/// Fee per task type, in the smallest currency unit.
#[derive(Debug, Clone, Copy)]
pub struct Pricing {
    pub complaint_filing: i64,
    pub rti_drafting: i64,
    pub developer_api_pro: i64,
}

impl Pricing {
    fn from_env() -> Self {
        Self {
            complaint_filing: env_i64("COMPLAINT_FEE", 4900),
            rti_drafting: env_i64("RTI_FEE", 1100),
            developer_api_pro: env_i64("DEVELOPER_PRO_FEE", 49900),
        }
    }
}

fn env_i64(key: &str, default: i64) -> i64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    pub dev_mode: bool,

    /// Public key id the checkout widget needs to open the gateway.
    pub gateway_key_id: String,
    /// Secret used for the client-callback signature scheme (scheme A).
    pub gateway_key_secret: String,
    /// Secret used for the webhook signature scheme (scheme B).
    pub gateway_webhook_secret: String,
    pub gateway_api_url: String,

    /// Resend API key; absent means email delivery is disabled (log only).
    pub resend_api_key: Option<String>,
    pub email_from: String,
    /// Civic department inbox for filed complaints.
    pub department_email: Option<String>,

    pub pricing: Pricing,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("JANHIT_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3000);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "janhit.db".to_string()),
            base_url,
            dev_mode,
            gateway_key_id: env::var("GATEWAY_KEY_ID").unwrap_or_default(),
            gateway_key_secret: env::var("GATEWAY_KEY_SECRET").unwrap_or_default(),
            gateway_webhook_secret: env::var("GATEWAY_WEBHOOK_SECRET").unwrap_or_default(),
            gateway_api_url: env::var("GATEWAY_API_URL")
                .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string()),
            resend_api_key: env::var("RESEND_API_KEY").ok(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "noreply@janhit.example".to_string()),
            department_email: env::var("DEPARTMENT_EMAIL").ok(),
            pricing: Pricing::from_env(),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
