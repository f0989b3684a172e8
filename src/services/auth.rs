use crate::{
    config::Config,
    error::{AppError, Result},
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// 认证服务：签发与校验会话令牌
#[derive(Clone)]
pub struct AuthService {
    config: Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,          // 用户名
    pub exp: i64,             // 过期时间
    pub iat: i64,             // 签发时间
    pub name: Option<String>, // 显示名
}

impl AuthService {
    pub async fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
        })
    }

    /// 为用户签发 HS256 令牌，登录流程和测试都用它
    pub fn issue_token(&self, username: &str, display_name: Option<&str>) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: username.to_string(),
            exp: now + self.config.jwt_expiry,
            iat: now,
            name: display_name.map(str::to_string),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_ref()),
        )?;
        Ok(token)
    }

    pub fn verify_jwt(&self, token: &str) -> Result<Claims> {
        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_ref());
        let validation = Validation::new(Algorithm::HS256);

        match decode::<Claims>(token, &decoding_key, &validation) {
            Ok(token_data) => {
                debug!("JWT token verified for user: {}", token_data.claims.sub);
                Ok(token_data.claims)
            }
            Err(e) => {
                warn!("JWT verification failed: {}", e);
                Err(AppError::Authentication("Invalid token".to_string()))
            }
        }
    }

    pub fn session_cookie_name(&self) -> &str {
        &self.config.session_cookie_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issued_token_verifies() {
        let auth = AuthService::new(&Config::default()).await.unwrap();
        let token = auth.issue_token("leo", Some("Leo")).unwrap();
        let claims = auth.verify_jwt(&token).unwrap();
        assert_eq!(claims.sub, "leo");
        assert_eq!(claims.name.as_deref(), Some("Leo"));
    }

    #[tokio::test]
    async fn test_token_from_other_secret_is_rejected() {
        let other = Config {
            jwt_secret: "another-secret".to_string(),
            ..Config::default()
        };
        let foreign = AuthService::new(&other).await.unwrap();
        let auth = AuthService::new(&Config::default()).await.unwrap();

        let token = foreign.issue_token("leo", None).unwrap();
        assert!(matches!(auth.verify_jwt(&token), Err(AppError::Authentication(_))));
        assert!(auth.verify_jwt("garbage").is_err());
    }
}
