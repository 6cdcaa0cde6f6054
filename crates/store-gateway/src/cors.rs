//! 跨域资源共享配置
//!
//! 声明式的 CORS 允许清单：哪些路径参与 CORS 评估、允许的来源/方法/
//! 请求头、预检缓存时长以及是否允许携带凭证。默认值即对外契约，
//! 配置文件可逐项覆盖。

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use serde::Deserialize;
use tower_http::cors::CorsLayer;

/// CORS 配置
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// 参与 CORS 评估的路径模式（尾部 `*` 为前缀通配）
    pub paths: Vec<String>,
    /// 允许的 HTTP 方法，`*` 表示全部
    pub allowed_methods: Vec<String>,
    /// 允许的来源，逐字面量匹配，不做模式匹配
    pub allowed_origins: Vec<String>,
    /// 允许的请求头
    pub allowed_headers: Vec<String>,
    /// 暴露给浏览器的响应头
    pub exposed_headers: Vec<String>,
    /// 预检结果缓存秒数（0 表示不缓存）
    pub max_age: u64,
    /// 是否允许跨域携带凭证（Cookie / Authorization）
    pub supports_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            paths: vec![
                "api/*".to_string(),
                "sanctum/csrf-cookie".to_string(),
                "storage/*".to_string(),
                "storage/categories/*".to_string(),
                "storage/products/*".to_string(),
            ],
            allowed_methods: vec!["*".to_string()],
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://localhost:5173".to_string(),
                "https://store-one-olive.vercel.app".to_string(),
            ],
            allowed_headers: vec![
                "Content-Type".to_string(),
                "Authorization".to_string(),
                "X-XSRF-TOKEN".to_string(),
                "ngrok-skip-browser-warning".to_string(),
            ],
            exposed_headers: vec![],
            max_age: 0,
            supports_credentials: true,
        }
    }
}

impl CorsConfig {
    /// 路径是否参与 CORS 评估
    ///
    /// 模式尾部的 `*` 做前缀匹配，其余逐字面量比较。
    /// 传入路径的前导 `/` 会被忽略。
    pub fn path_matches(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        self.paths.iter().any(|pattern| {
            if let Some(prefix) = pattern.strip_suffix('*') {
                path.starts_with(prefix)
            } else {
                path == pattern
            }
        })
    }

    /// 来源是否在允许清单内（逐字面量比较）
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }

    /// 构建 tower-http 的 CORS 层
    ///
    /// 凭证模式下 tower-http 禁止通配符，`*` 方法在这里展开为
    /// 具体的方法列表，来源与请求头本就是字面量清单。
    pub fn to_layer(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();

        let headers: Vec<HeaderName> = self
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();

        let methods: Vec<Method> = if self.allowed_methods.iter().any(|m| m == "*") {
            vec![
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::HEAD,
                Method::OPTIONS,
            ]
        } else {
            self.allowed_methods
                .iter()
                .filter_map(|m| m.parse().ok())
                .collect()
        };

        let mut layer = CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(headers)
            .max_age(Duration::from_secs(self.max_age));

        if !self.exposed_headers.is_empty() {
            let exposed: Vec<HeaderName> = self
                .exposed_headers
                .iter()
                .filter_map(|h| h.parse().ok())
                .collect();
            layer = layer.expose_headers(exposed);
        }

        if self.supports_credentials {
            layer = layer.allow_credentials(true);
        }

        layer
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values_are_the_contract() {
        let config = CorsConfig::default();

        assert_eq!(
            config.paths,
            vec![
                "api/*",
                "sanctum/csrf-cookie",
                "storage/*",
                "storage/categories/*",
                "storage/products/*",
            ]
        );
        assert_eq!(config.allowed_methods, vec!["*"]);
        assert_eq!(
            config.allowed_origins,
            vec![
                "http://localhost:3000",
                "http://localhost:5173",
                "https://store-one-olive.vercel.app",
            ]
        );
        assert_eq!(
            config.allowed_headers,
            vec![
                "Content-Type",
                "Authorization",
                "X-XSRF-TOKEN",
                "ngrok-skip-browser-warning",
            ]
        );
        assert!(config.exposed_headers.is_empty());
        assert_eq!(config.max_age, 0);
        assert!(config.supports_credentials);
    }

    #[test]
    fn test_path_matching() {
        let config = CorsConfig::default();

        assert!(config.path_matches("api/orders"));
        assert!(config.path_matches("/api/orders/42"));
        assert!(config.path_matches("sanctum/csrf-cookie"));
        assert!(config.path_matches("storage/products/img.png"));
        assert!(config.path_matches("storage/categories/1/banner.jpg"));

        assert!(!config.path_matches("admin/orders"));
        assert!(!config.path_matches("sanctum/other"));
        // 精确模式不做前缀匹配
        assert!(!config.path_matches("sanctum/csrf-cookie/extra"));
    }

    #[test]
    fn test_origin_matching_is_literal() {
        let config = CorsConfig::default();

        assert!(config.origin_allowed("https://store-one-olive.vercel.app"));
        assert!(config.origin_allowed("http://localhost:3000"));

        assert!(!config.origin_allowed("https://evil.example.com"));
        // 不做子域/模式匹配
        assert!(!config.origin_allowed("https://sub.store-one-olive.vercel.app"));
        assert!(!config.origin_allowed("http://localhost:3001"));
    }

    #[test]
    fn test_storefront_origin_allowed_on_api_path_with_credentials() {
        let config = CorsConfig::default();

        assert!(config.path_matches("api/orders"));
        assert!(config.origin_allowed("https://store-one-olive.vercel.app"));
        assert!(config.supports_credentials);
    }

    #[test]
    fn test_to_layer_builds_under_credentials_mode() {
        // 凭证模式 + 字面量清单的组合必须能构建出 CORS 层
        // （tower-http 在凭证模式遇到通配符会 panic）
        let config = CorsConfig::default();
        let _layer = config.to_layer();
    }

    #[test]
    fn test_to_layer_with_explicit_methods() {
        let config = CorsConfig {
            allowed_methods: vec!["GET".to_string(), "POST".to_string()],
            ..CorsConfig::default()
        };
        let _layer = config.to_layer();
    }
}
