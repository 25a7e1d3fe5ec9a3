// ==========================================
// 客户数据导入 - 行映射器实现
// ==========================================
// 职责: 原始行 → 规范实体（客户/地址/存储卡）
// 红线: 映射失败返回行级校验错误,不中止整个运行;
//       被拒绝行报告原始值而非部分规范化值
// ==========================================

use std::sync::Arc;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::ImportConfig;
use crate::domain::customer::{
    CanonicalAddress, CanonicalCard, CanonicalCustomer, RawRow, NULL_SENTINEL,
};
use crate::importer::directory::DirectoryResolver;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::normalizer::FieldNormalizer;

/// 固定掩码段: 卡号中间 12 位
const CARD_MASK_SEGMENT: &str = "xxxxxxxxxxxx";

/// 生成密码长度
const GENERATED_PASSWORD_LEN: usize = 10;

pub struct RowMapper {
    config: ImportConfig,
    directory: Arc<DirectoryResolver>,
    normalizer: FieldNormalizer,
}

impl RowMapper {
    pub fn new(config: ImportConfig, directory: Arc<DirectoryResolver>) -> Self {
        Self {
            config,
            directory,
            normalizer: FieldNormalizer,
        }
    }

    // ==========================================
    // 客户行映射
    // ==========================================

    /// 原始行 → 规范客户实体
    ///
    /// 规则: email 转小写; 姓名原样透传; NULL 哨兵视为缺失;
    ///       wcsid 列保留为显式实体 ID; 无密码列时可生成随机密码
    pub fn map_customer(&self, row: &RawRow) -> ImportResult<CanonicalCustomer> {
        let mut customer = CanonicalCustomer {
            website_id: self.config.website_id,
            store_id: self.config.store_id,
            ..Default::default()
        };

        for (key, value) in &row.columns {
            if value.is_empty() || value == NULL_SENTINEL {
                continue;
            }

            if self.config.find_customer_by.iter().any(|a| a == key) {
                customer.legacy_customer_id = Some(value.clone());
                continue;
            }

            match key.as_str() {
                "email" => customer.email = Some(value.to_lowercase()),
                "firstname" => customer.firstname = Some(value.clone()),
                "middlename" => customer.middlename = Some(value.clone()),
                "lastname" => customer.lastname = Some(value.clone()),
                "password" => customer.password = Some(value.clone()),
                "group_id" => customer.group_id = Some(value.clone()),
                "created_at" => customer.created_at = Some(value.clone()),
                // 源系统主键,保留为显式实体 ID
                "wcsid" => {
                    let id = value.parse::<i64>().map_err(|_| ImportError::Validation {
                        row: row.row_number,
                        field: "wcsid".to_string(),
                        message: format!("无法解析为实体 ID: {}", value),
                    })?;
                    customer.entity_id = Some(id);
                }
                _ => {
                    if self.config.custom_attributes.iter().any(|a| a == key) {
                        customer
                            .custom_attributes
                            .push((key.clone(), value.clone()));
                    }
                }
            }
        }

        if customer.password.is_none() && self.config.generate_passwords {
            customer.password = Some(generate_password());
        }

        Ok(customer)
    }

    // ==========================================
    // 地址行映射
    // ==========================================

    /// 原始行 → 规范地址实体
    ///
    /// 规则: 姓名/公司/城市首字母大写; 美国行邮编补零、地区走目录解析;
    ///       街道由 address1/2/3/suite 拼装（至多两个物理行）;
    ///       空电话映射为哨兵值
    pub fn map_address(&self, row: &RawRow) -> ImportResult<CanonicalAddress> {
        let mut address = CanonicalAddress::default();

        // 国家原始值先行读取: 邮编与地区分支都依赖它
        let raw_country = row.get("country").unwrap_or("");

        let mut street_lines: Vec<String> = Vec::new();

        for (key, value) in &row.columns {
            if key == &self.config.customer_id_column {
                // 归属标识列由运行驱动器读取,不进实体
                continue;
            }
            if value == NULL_SENTINEL {
                continue;
            }

            match key.as_str() {
                "firstname" => {
                    if !value.is_empty() {
                        address.firstname = Some(self.normalizer.capitalize_words(value));
                    }
                }
                "middlename" => {
                    if !value.is_empty() {
                        address.middlename = Some(self.normalizer.capitalize_words(value));
                    }
                }
                "lastname" => {
                    if !value.is_empty() {
                        address.lastname = Some(self.normalizer.capitalize_words(value));
                    }
                }
                "company" => {
                    if !value.is_empty() {
                        address.company = Some(self.normalizer.capitalize_words(value));
                    }
                }
                "city" => {
                    if !value.is_empty() {
                        address.city = Some(self.normalizer.capitalize_words(value));
                    }
                }
                // 街道第一、二行各占一个物理行
                "address1" | "address2" => {
                    if !value.is_empty() {
                        street_lines.push(self.normalizer.capitalize_words(value));
                    }
                }
                // 第三行与 suite 以空格并入末行,保持至多两个物理行
                "address3" | "suite" => {
                    if !value.is_empty() {
                        let fragment = self.normalizer.capitalize_words(value);
                        match street_lines.last_mut() {
                            Some(last) => {
                                last.push(' ');
                                last.push_str(&fragment);
                            }
                            None => street_lines.push(fragment),
                        }
                    }
                }
                "zip" | "postcode" => {
                    if !value.is_empty() {
                        // 补零口径: 小写折叠判定 US
                        if self.normalizer.is_us_country_folded(raw_country) {
                            address.postcode = Some(self.normalizer.pad_us_postcode(value));
                        } else {
                            address.postcode = Some(value.clone());
                        }
                    }
                }
                "state" | "region" => {
                    self.map_region(row.row_number, raw_country, value, &mut address)?;
                }
                "phone" | "telephone" => {
                    address.telephone = Some(self.normalizer.normalize_telephone(value));
                }
                "country" => {
                    if !value.is_empty() {
                        let country = self.directory.find_country_by_name(value).ok_or_else(
                            || ImportError::Validation {
                                row: row.row_number,
                                field: "country".to_string(),
                                message: format!("无法识别的国家: {}", value),
                            },
                        )?;
                        address.country_id = Some(country.code.clone());
                    }
                }
                "created_at" => {
                    if !value.is_empty() {
                        address.created_at = Some(value.clone());
                    }
                }
                "updated_at" => {
                    if !value.is_empty() {
                        address.updated_at = Some(value.clone());
                    }
                }
                _ => {
                    if !value.is_empty() && self.config.custom_attributes.iter().any(|a| a == key)
                    {
                        address
                            .custom_attributes
                            .push((key.clone(), value.clone()));
                    }
                }
            }
        }

        if !street_lines.is_empty() {
            address.street = Some(street_lines.join("\n"));
        }

        Ok(address)
    }

    /// 地区字段解析
    ///
    /// 美国行（精确变体口径）: 2 字符走代码查找,更长走名称查找,
    /// 命中后写入规范显示名与地区 ID; 未命中或长度不足则校验失败。
    /// 非美国行: 首字母大写后原样保留,无地区 ID。
    fn map_region(
        &self,
        row_number: usize,
        raw_country: &str,
        value: &str,
        address: &mut CanonicalAddress,
    ) -> ImportResult<()> {
        if !self.normalizer.is_us_country_variant(raw_country) {
            if !value.is_empty() {
                address.region = Some(self.normalizer.capitalize_words(value));
            }
            return Ok(());
        }

        let region = if value.len() == 2 && value != "--" {
            self.directory.find_region_by_code("US", value)
        } else if value.len() > 2 {
            self.directory.find_region_by_name("US", value)
        } else {
            None
        };

        match region {
            Some(r) => {
                address.region = Some(r.display_name.clone());
                address.region_id = Some(r.id);
                Ok(())
            }
            None => Err(ImportError::Validation {
                row: row_number,
                field: "region".to_string(),
                message: format!("无法解析的地区值: {}", value),
            }),
        }
    }

    // ==========================================
    // 存储卡行映射
    // ==========================================

    /// 原始行 → 规范存储卡实体
    ///
    /// 规则: 卡号立即脱敏（仅保留前 2 位与第 3-4 位）;
    ///       公共哈希由网关令牌确定性派生
    pub fn map_card(&self, row: &RawRow) -> ImportResult<CanonicalCard> {
        let mut card = CanonicalCard::default();

        for (key, value) in &row.columns {
            if value.is_empty() || value == NULL_SENTINEL {
                continue;
            }

            match key.as_str() {
                "CARDTOKEN" => {
                    card.public_hash = Some(public_hash(value));
                    card.gateway_token = Some(value.clone());
                }
                "CARDBRAND" => card.brand = Some(value.clone()),
                "CARDNUMBER" => card.masked_number = Some(mask_card_number(value)),
                "EXPIRYMONTH" => card.expiry_month = Some(value.clone()),
                "EXPIRYYEAR" => card.expiry_year = Some(value.clone()),
                "CURRENCY" => card.currency = Some(value.clone()),
                _ => {}
            }
        }

        Ok(card)
    }
}

/// 卡号脱敏: 前 2 位 + 固定掩码段 + 源串第 3-4 位
///
/// "4111111111111111" → "41xxxxxxxxxxxx11"
pub fn mask_card_number(number: &str) -> String {
    let head: String = number.chars().take(2).collect();
    let tail: String = number.chars().skip(2).take(2).collect();
    format!("{}{}{}", head, CARD_MASK_SEGMENT, tail)
}

/// 网关令牌 → 公共哈希（hex SHA-256）
pub fn public_hash(gateway_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(gateway_token.as_bytes());
    hex::encode(hasher.finalize())
}

/// 生成随机密码（UUID 派生的 10 位十六进制串）
fn generate_password() -> String {
    Uuid::new_v4().simple().to_string()[..GENERATED_PASSWORD_LEN].to_string()
}
