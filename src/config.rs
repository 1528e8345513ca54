use std::env;

// ============================================================================
// Configuration - environment driven, with sane local-dev defaults
// ============================================================================

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub kafka: KafkaConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct KafkaConfig {
    pub brokers: String,
    /// Topic carrying all order lifecycle events.
    pub topic: String,
    /// Consumer group for the event-consumer binary.
    pub consumer_group: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.dbname
        )
    }
}

impl Config {
    /// Load configuration from the environment, reading a `.env` file first
    /// if one is present.
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        Self {
            server: ServerConfig {
                port: env_or("PORT", "8080").parse().unwrap_or(8080),
            },
            database: DatabaseConfig {
                host: env_or("DB_HOST", "localhost"),
                port: env_or("DB_PORT", "5432").parse().unwrap_or(5432),
                user: env_or("DB_USER", "orders_user"),
                password: env_or("DB_PASSWORD", "orders_pass"),
                dbname: env_or("DB_NAME", "orders_db"),
                max_connections: env_or("DB_MAX_CONNECTIONS", "100").parse().unwrap_or(100),
            },
            kafka: KafkaConfig {
                brokers: env_or("KAFKA_BROKERS", "127.0.0.1:9092"),
                topic: env_or("KAFKA_ORDERS_TOPIC", "order-events"),
                consumer_group: env_or("KAFKA_CONSUMER_GROUP", "order-events-consumer"),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
