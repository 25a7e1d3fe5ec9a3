// ==========================================
// 客户数据导入 - 去重判定引擎实现
// ==========================================
// 职责: 规范实体 + 自然键查找 → 新建/跳过/补丁/拒绝 判定
// 红线: 引擎只做判定,不执行写入（写入由运行驱动器负责）;
//       客户流先查已存在再查必填（已存在的残缺行仍计跳过,历史行为）
// ==========================================

use tracing::debug;

use crate::config::ImportConfig;
use crate::domain::customer::{CanonicalAddress, CanonicalCard, CanonicalCustomer};
use crate::domain::types::{CardMatchPolicy, ReconcileDecision, RejectReason};
use crate::importer::error::ImportResult;
use crate::repository::customer_repo::{AddressRepository, CardRepository, CustomerRepository};

/// 地址必填字段集
const ADDRESS_REQUIRED_FIELDS: [&str; 8] = [
    "firstname",
    "lastname",
    "street",
    "city",
    "region",
    "postcode",
    "country_id",
    "telephone",
];

/// 客户必填字段集
const CUSTOMER_REQUIRED_FIELDS: [&str; 3] = ["email", "firstname", "lastname"];

pub struct Reconciler {
    config: ImportConfig,
}

impl Reconciler {
    pub fn new(config: ImportConfig) -> Self {
        Self { config }
    }

    // ==========================================
    // 客户判定
    // ==========================================

    /// 客户行判定: 自然键 (email, website_id)
    ///
    /// 命中已有客户时走补丁路径（允许清单仅 legacy_customer_id）,
    /// 但仍计入"已存在跳过"。必填校验只在新建路径执行。
    pub async fn decide_customer(
        &self,
        candidate: &CanonicalCustomer,
        repo: &dyn CustomerRepository,
    ) -> ImportResult<ReconcileDecision> {
        // email 缺失无法构成自然键,直接拒绝
        let email = match candidate.email.as_deref() {
            Some(e) => e,
            None => {
                return Ok(ReconcileDecision::Reject(
                    RejectReason::MissingRequiredField {
                        field: "email".to_string(),
                    },
                ))
            }
        };

        let existing = repo
            .find_by_attributes(
                &["email".to_string()],
                &[email.to_string()],
                candidate.website_id,
            )
            .await?;

        if let Some(record) = existing {
            debug!(
                email = email,
                existing_id = record.entity_id,
                "客户自然键命中"
            );
            if self.config.patch_existing_customers && candidate.legacy_customer_id.is_some() {
                return Ok(ReconcileDecision::PatchExisting {
                    existing_id: record.entity_id,
                    legacy_customer_id: candidate.legacy_customer_id.clone(),
                });
            }
            return Ok(ReconcileDecision::SkipExisting {
                existing_id: record.entity_id,
            });
        }

        if let Some(field) = missing_customer_field(candidate) {
            return Ok(ReconcileDecision::Reject(
                RejectReason::MissingRequiredField {
                    field: field.to_string(),
                },
            ));
        }

        Ok(ReconcileDecision::Create)
    }

    // ==========================================
    // 地址判定
    // ==========================================

    /// 地址行判定: 必填校验 → 自然键全字段精确相等查找
    ///
    /// 自然键任一字段不同（含大小写/空白差异）即视为新地址,无模糊匹配。
    pub async fn decide_address(
        &self,
        parent_id: i64,
        candidate: &CanonicalAddress,
        repo: &dyn AddressRepository,
    ) -> ImportResult<ReconcileDecision> {
        if let Some(field) = missing_address_field(candidate) {
            return Ok(ReconcileDecision::Reject(
                RejectReason::MissingRequiredField {
                    field: field.to_string(),
                },
            ));
        }

        match repo.find_by_natural_key(parent_id, candidate).await? {
            Some(existing_id) => {
                debug!(parent_id, existing_id, "地址自然键命中");
                Ok(ReconcileDecision::SkipExisting { existing_id })
            }
            None => Ok(ReconcileDecision::Create),
        }
    }

    // ==========================================
    // 存储卡判定
    // ==========================================

    /// 存储卡行判定: 必填校验 → 按策略查重
    ///
    /// HashMatch（默认）按 (customer_id, public_hash) 判定已存在,
    /// 且要求 currency 必填; AlwaysCreate 永不判定已存在（历史兼容）。
    pub async fn decide_card(
        &self,
        customer_id: i64,
        candidate: &CanonicalCard,
        repo: &dyn CardRepository,
    ) -> ImportResult<ReconcileDecision> {
        if let Some(field) = self.missing_card_field(candidate) {
            return Ok(ReconcileDecision::Reject(
                RejectReason::MissingRequiredField {
                    field: field.to_string(),
                },
            ));
        }

        match self.config.card_match_policy {
            CardMatchPolicy::AlwaysCreate => Ok(ReconcileDecision::Create),
            CardMatchPolicy::HashMatch => {
                // 必填校验已保证 public_hash 存在
                let hash = match candidate.public_hash.as_deref() {
                    Some(h) => h,
                    None => {
                        return Ok(ReconcileDecision::Reject(
                            RejectReason::MissingRequiredField {
                                field: "token".to_string(),
                            },
                        ))
                    }
                };
                match repo.find_by_public_hash(customer_id, hash).await? {
                    Some(existing_id) => {
                        debug!(customer_id, existing_id, "存储卡公共哈希命中");
                        Ok(ReconcileDecision::SkipExisting { existing_id })
                    }
                    None => Ok(ReconcileDecision::Create),
                }
            }
        }
    }

    fn missing_card_field(&self, card: &CanonicalCard) -> Option<&'static str> {
        if card.gateway_token.is_none() {
            return Some("token");
        }
        if card.brand.is_none() {
            return Some("brand");
        }
        if card.masked_number.is_none() {
            return Some("masked_number");
        }
        if card.expiry_month.is_none() {
            return Some("expiry_month");
        }
        if card.expiry_year.is_none() {
            return Some("expiry_year");
        }
        // currency 仅修正版策略要求
        if matches!(self.config.card_match_policy, CardMatchPolicy::HashMatch)
            && card.currency.is_none()
        {
            return Some("currency");
        }
        None
    }
}

fn missing_customer_field(customer: &CanonicalCustomer) -> Option<&'static str> {
    for field in CUSTOMER_REQUIRED_FIELDS {
        let present = match field {
            "email" => customer.email.is_some(),
            "firstname" => customer.firstname.is_some(),
            "lastname" => customer.lastname.is_some(),
            _ => true,
        };
        if !present {
            return Some(field);
        }
    }
    None
}

fn missing_address_field(address: &CanonicalAddress) -> Option<&'static str> {
    for field in ADDRESS_REQUIRED_FIELDS {
        let present = match field {
            "firstname" => address.firstname.is_some(),
            "lastname" => address.lastname.is_some(),
            "street" => address.street.is_some(),
            "city" => address.city.is_some(),
            "region" => address.region.is_some(),
            "postcode" => address.postcode.is_some(),
            "country_id" => address.country_id.is_some(),
            "telephone" => address.telephone.is_some(),
            _ => true,
        };
        if !present {
            return Some(field);
        }
    }
    None
}
