//! 商品数据工厂
//!
//! 使用 fake crate 生成逼真的商品草稿，用于测试与种子数据。
//! SKU 在工厂实例内做冲突校验，保证一次运行内全局唯一。
//!
//! 折扣价与原价独立采样，这里不强制 discount_price ≤ price，
//! 需要该约束的调用方自行收紧 `FactoryConfig` 的区间。

use std::ops::RangeInclusive;

use dashmap::DashSet;
use fake::Fake;
use fake::faker::company::en::CatchPhrase;
use fake::faker::lorem::en::{Sentence, Sentences, Word};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// 草稿模型
// ---------------------------------------------------------------------------

/// 商品分类草稿
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDraft {
    pub name: String,
    pub slug: String,
}

impl CategoryDraft {
    /// 生成随机分类
    pub fn random() -> Self {
        let name: String = CatchPhrase().fake();
        let slug = slugify(&name);
        Self { name, slug }
    }
}

/// 商品草稿
///
/// 未提交的新记录：没有 id，创建后不在本模块内更新或删除。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub category: CategoryDraft,
    pub name: String,
    /// 由 name 确定性派生的 URL 安全标识
    pub slug: String,
    pub description: String,
    /// 保留两位小数
    pub price: f64,
    /// 约半数商品带折扣价
    pub discount_price: Option<f64>,
    pub stock: u32,
    /// 一次运行内全局唯一
    pub sku: String,
    pub seo_title: String,
    pub seo_description: String,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// slugify
// ---------------------------------------------------------------------------

/// 将名称转换为 URL 安全的小写连字符形式
///
/// 非字母数字字符折叠为单个连字符，首尾连字符去除。
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_dash = true;

    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_dash = false;
        } else if !last_was_dash {
            slug.push('-');
            last_was_dash = true;
        }
    }

    slug.trim_end_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// FactoryConfig / ProductFactory
// ---------------------------------------------------------------------------

/// 工厂配置
///
/// 控制生成数据的取值区间与概率分布
#[derive(Debug, Clone)]
pub struct FactoryConfig {
    pub price_range: RangeInclusive<f64>,
    pub discount_range: RangeInclusive<f64>,
    pub stock_range: RangeInclusive<u32>,
    /// 带折扣价的概率
    pub discount_probability: f64,
    /// 上架状态的概率
    pub active_probability: f64,
}

impl Default for FactoryConfig {
    /// 默认配置：价格 [10.00, 1000.00]，折扣价 [5.00, 900.00]（约半数出现），
    /// 库存 [0, 100]，约 80% 商品处于上架状态
    fn default() -> Self {
        Self {
            price_range: 10.00..=1000.00,
            discount_range: 5.00..=900.00,
            stock_range: 0..=100,
            discount_probability: 0.5,
            active_probability: 0.8,
        }
    }
}

/// 商品数据工厂
///
/// 每次调用产出一份全新的未提交草稿；SKU 记录在工厂内的集合中
/// 做冲突校验，同一工厂实例生成的 SKU 不会重复。
pub struct ProductFactory {
    config: FactoryConfig,
    issued_skus: DashSet<String>,
}

impl ProductFactory {
    pub fn new(config: FactoryConfig) -> Self {
        Self {
            config,
            issued_skus: DashSet::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FactoryConfig::default())
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// 生成商品草稿，分类为新建的随机分类
    pub fn make(&self) -> ProductDraft {
        self.make_in(CategoryDraft::random())
    }

    /// 在指定分类下生成商品草稿
    pub fn make_in(&self, category: CategoryDraft) -> ProductDraft {
        let mut rng = rand::thread_rng();

        let name: String = Word().fake();
        let slug = slugify(&name);

        let description: String = Sentences(3..6).fake::<Vec<String>>().join(" ");

        let price = round2(rng.gen_range(self.config.price_range.clone()));
        let discount_price = if rng.gen_bool(self.config.discount_probability) {
            Some(round2(rng.gen_range(self.config.discount_range.clone())))
        } else {
            None
        };

        let stock = rng.gen_range(self.config.stock_range.clone());

        ProductDraft {
            category,
            name,
            slug,
            description,
            price,
            discount_price,
            stock,
            sku: self.unique_sku(),
            seo_title: Sentence(4..8).fake(),
            seo_description: Sentence(8..16).fake(),
            is_active: rng.gen_bool(self.config.active_probability),
        }
    }

    /// 批量生成商品草稿
    pub fn make_many(&self, count: usize) -> Vec<ProductDraft> {
        (0..count).map(|_| self.make()).collect()
    }

    /// 已发放的 SKU 数量
    pub fn issued_sku_count(&self) -> usize {
        self.issued_skus.len()
    }

    /// 生成未使用过的 SKU
    ///
    /// 随机 UUID 冲突概率极低，但仍与已发放集合核对后才返回。
    fn unique_sku(&self) -> String {
        loop {
            let sku = Uuid::new_v4().to_string();
            if self.issued_skus.insert(sku.clone()) {
                return sku;
            }
        }
    }
}

/// 四舍五入到两位小数
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
