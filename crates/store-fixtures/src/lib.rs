//! 测试数据工具
//!
//! 为测试与演示环境生成随机但合法的商品草稿，以及预置演示用的
//! 用户与订单数据。不参与生产请求处理。
//!
//! # 使用示例
//!
//! ```rust
//! use store_fixtures::factory::ProductFactory;
//!
//! let factory = ProductFactory::with_defaults();
//! let product = factory.make();
//!
//! assert!(product.price >= 10.0 && product.price <= 1000.0);
//! assert!(!product.sku.is_empty());
//! ```

pub mod factory;
pub mod seed;
