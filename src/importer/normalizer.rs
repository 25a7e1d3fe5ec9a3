// ==========================================
// 客户数据导入 - 字段规范化器实现
// ==========================================
// 职责: 单字段的纯函数变换（首字母大写 / 邮编补零 / 电话哨兵）
// 红线: 无状态,不读外部可变状态,可按行并发调用
// ==========================================

use crate::domain::customer::TELEPHONE_PLACEHOLDER;

/// 美国国家写法变体（精确匹配清单,区分大小写）
///
/// 历史行为: 地区解析/US 判定使用该清单做精确成员匹配,
/// 而邮编补零使用小写折叠匹配。两种口径刻意保留,不统一。
pub const US_COUNTRY_VARIANTS: [&str; 6] = ["US", "us", "USA", "usa", "United States", "united states"];

pub struct FieldNormalizer;

impl FieldNormalizer {
    /// 单词首字母大写,其余字符保持原样
    ///
    /// # 示例
    /// - "new york" → "New York"
    /// - "mcDonald" → "McDonald"（不做小写折叠）
    pub fn capitalize_words(&self, value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        let mut at_word_start = true;
        for c in value.chars() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            at_word_start = c.is_whitespace();
        }
        out
    }

    /// 美国邮编左侧补零到 5 位; 已达 5 位及以上原样透传
    pub fn pad_us_postcode(&self, value: &str) -> String {
        if value.len() >= 5 {
            value.to_string()
        } else {
            format!("{:0>5}", value)
        }
    }

    /// 电话空值映射为哨兵 000-000-0000,非空原样透传（不做格式校验）
    pub fn normalize_telephone(&self, value: &str) -> String {
        if value.is_empty() {
            TELEPHONE_PLACEHOLDER.to_string()
        } else {
            value.to_string()
        }
    }

    /// 邮编口径的 US 判定: 小写折叠后匹配 us/usa/united states
    pub fn is_us_country_folded(&self, value: &str) -> bool {
        matches!(
            value.to_lowercase().as_str(),
            "us" | "usa" | "united states"
        )
    }

    /// 地区口径的 US 判定: 精确成员匹配写法变体清单
    ///
    /// 注意与 is_us_country_folded 的口径差异: "Usa" 折叠口径命中,
    /// 精确口径不命中。该不一致为历史行为,按字段分别保留。
    pub fn is_us_country_variant(&self, value: &str) -> bool {
        US_COUNTRY_VARIANTS.contains(&value)
    }
}
