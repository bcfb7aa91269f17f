//! Configuración de variables de entorno
//!
//! Este módulo maneja la configuración del entorno y variables de configuración.

use std::env;

/// Configuración del entorno
#[derive(Debug, Clone)]
pub struct EnvironmentConfig {
    pub environment: String,
    pub port: u16,
    pub host: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub cors_origins: Vec<String>,
    /// URL del broker Redis para el fan-out. None desactiva el fan-out
    /// (se usa el publisher no-op).
    pub redis_url: Option<String>,
    /// Canal de pub/sub compartido entre todas las instancias
    pub fanout_channel: String,
    /// Hora UTC (0-23) a la que corre la materialización diaria de trips
    pub materialization_hour: u32,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_expiration: env::var("JWT_EXPIRATION")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .expect("JWT_EXPIRATION must be a valid number"),
            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_default()
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
                .collect(),
            redis_url: env::var("REDIS_URL").ok(),
            fanout_channel: env::var("FANOUT_CHANNEL")
                .unwrap_or_else(|_| "school_transport:events".to_string()),
            materialization_hour: parse_materialization_hour(
                env::var("MATERIALIZATION_HOUR").unwrap_or_else(|_| "4".to_string()),
            ),
        }
    }
}

/// El rango se valida acá, en el arranque, y no recién cuando la tarea
/// diaria calcula su primera corrida.
fn parse_materialization_hour(raw: String) -> u32 {
    let hour: u32 = raw
        .parse()
        .expect("MATERIALIZATION_HOUR must be a valid hour (0-23)");
    assert!(hour <= 23, "MATERIALIZATION_HOUR must be a valid hour (0-23)");
    hour
}

impl EnvironmentConfig {
    /// Verificar si estamos en modo desarrollo
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Verificar si estamos en modo producción
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Obtener la URL del servidor
    pub fn server_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_materialization_hour_in_range() {
        assert_eq!(parse_materialization_hour("0".to_string()), 0);
        assert_eq!(parse_materialization_hour("23".to_string()), 23);
    }

    #[test]
    #[should_panic(expected = "MATERIALIZATION_HOUR")]
    fn test_materialization_hour_rejects_out_of_range() {
        parse_materialization_hour("24".to_string());
    }
}
