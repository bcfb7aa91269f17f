//! Servicio de JWT
//!
//! Verificación y generación de tokens. La identidad {user_id, role} se
//! extrae de los claims; un token inválido rechaza la conexión o request
//! antes de tocar cualquier otra cosa.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::EnvironmentConfig;
use crate::models::identity::{Identity, UserRole};
use crate::utils::errors::AppError;

/// Claims del JWT
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Verifica un token y extrae la identidad autenticada
pub fn verify_token(token: &str, config: &EnvironmentConfig) -> Result<Identity, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Token inválido".to_string()))?;

    let claims = token_data.claims;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("ID de usuario inválido".to_string()))?;
    let role = UserRole::parse(&claims.role)
        .ok_or_else(|| AppError::Unauthorized("Rol desconocido".to_string()))?;

    Ok(Identity::new(user_id, role))
}

/// Genera un token para un usuario
pub fn generate_token(
    user_id: Uuid,
    role: UserRole,
    config: &EnvironmentConfig,
) -> Result<String, AppError> {
    let now = chrono::Utc::now();
    let expires_at = now + chrono::Duration::seconds(config.jwt_expiration as i64);

    let claims = Claims {
        sub: user_id.to_string(),
        role: role.as_str().to_string(),
        exp: expires_at.timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_ref());

    encode(&Header::default(), &claims, &encoding_key)
        .map_err(|e| AppError::Internal(format!("Error generando JWT: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> EnvironmentConfig {
        EnvironmentConfig {
            environment: "test".to_string(),
            port: 3000,
            host: "127.0.0.1".to_string(),
            jwt_secret: "super-secret-test-key".to_string(),
            jwt_expiration: 3600,
            cors_origins: vec![],
            redis_url: None,
            fanout_channel: "test:events".to_string(),
            materialization_hour: 4,
        }
    }

    #[test]
    fn test_generate_and_verify() {
        let config = test_config();
        let user_id = Uuid::new_v4();
        let token = generate_token(user_id, UserRole::Driver, &config).unwrap();
        let identity = verify_token(&token, &config).unwrap();
        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role, UserRole::Driver);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let config = test_config();
        let mut other = test_config();
        other.jwt_secret = "otra-clave".to_string();

        let token = generate_token(Uuid::new_v4(), UserRole::Parent, &config).unwrap();
        assert!(matches!(
            verify_token(&token, &other),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        let config = test_config();
        assert!(verify_token("no-es-un-jwt", &config).is_err());
    }
}
