// ==========================================
// 客户数据导入 - 国家/地区目录解析器
// ==========================================
// 职责: 内存目录查找（国家代码/显示名、地区代码/名称）
// 红线: 国家显示名查找区分大小写（历史行为,刻意保留）;
//       地区查找不区分大小写,且始终限定国家范围
// ==========================================

use serde::{Deserialize, Serialize};

/// 国家目录条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountryRecord {
    /// ISO 两位代码,如 "US"
    pub code: String,
    /// 展示名,如 "United States"
    pub display_name: String,
}

/// 地区（州/省）目录条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: i64,
    /// 地区代码,如 "CA"
    pub code: String,
    /// 规范显示名,如 "California"
    pub display_name: String,
    /// 归属国家 ISO 代码
    pub country_code: String,
}

/// 目录解析器: 持有国家与地区的只读快照
pub struct DirectoryResolver {
    countries: Vec<CountryRecord>,
    regions: Vec<RegionRecord>,
}

impl DirectoryResolver {
    pub fn new(countries: Vec<CountryRecord>, regions: Vec<RegionRecord>) -> Self {
        Self { countries, regions }
    }

    /// 按展示名查国家（区分大小写的线性扫描,历史行为）
    ///
    /// "United States" 命中,"united states" 不命中。
    pub fn find_country_by_name(&self, display_name: &str) -> Option<&CountryRecord> {
        self.countries.iter().find(|c| c.display_name == display_name)
    }

    /// 按 ISO 代码查国家（区分大小写）
    pub fn find_country_by_code(&self, code: &str) -> Option<&CountryRecord> {
        self.countries.iter().find(|c| c.code == code)
    }

    /// 按地区代码查地区,限定国家（不区分大小写）
    pub fn find_region_by_code(&self, country_code: &str, region_code: &str) -> Option<&RegionRecord> {
        self.regions.iter().find(|r| {
            r.country_code == country_code && r.code.eq_ignore_ascii_case(region_code)
        })
    }

    /// 按地区名称查地区,限定国家（不区分大小写）
    pub fn find_region_by_name(&self, country_code: &str, region_name: &str) -> Option<&RegionRecord> {
        self.regions.iter().find(|r| {
            r.country_code == country_code && r.display_name.eq_ignore_ascii_case(region_name)
        })
    }
}
