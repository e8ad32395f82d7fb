//! Core Data Models
//!
//! This module defines the data structures shared by ingestion, summarization and the
//! license calculator.
//!
//! ## Data Flow
//!
//! 1. **Raw Data**: [`InstallRecord`] - one observed installation, parsed from a CSV log
//! 2. **Demand**: [`DemandSummary`] - deduplicated install counts per category for one user
//! 3. **Rule**: [`LicenseRule`] - total and per-category caps that bound a single license
//!
//! ## Category Mappings
//!
//! Every per-category quantity is stored in a [`CategoryMap`], a fixed-size array indexed
//! by [`Category`]. A `CategoryMap` always holds a value for every category, so lookups
//! never miss and a category left out of a rule file simply has a cap of zero.

use crate::error::RuleViolation;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use thiserror::Error;

/// Device kinds a license can cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Desktop,
    Laptop,
    Mobile,
}

impl Category {
    pub const COUNT: usize = 3;

    /// All categories in enumeration order.
    pub const ALL: [Category; Category::COUNT] =
        [Category::Desktop, Category::Laptop, Category::Mobile];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Numeric code used by install logs that store the category as a number.
    pub fn code(self) -> u8 {
        self as u8 + 1
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Desktop => "desktop",
            Category::Laptop => "laptop",
            Category::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Desktop => "Desktop",
            Category::Laptop => "Laptop",
            Category::Mobile => "Mobile",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown device category: {0:?}")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Accepts the category name in any case, or its numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| {
                c.as_str().eq_ignore_ascii_case(trimmed) || trimmed == c.code().to_string()
            })
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Total mapping from [`Category`] to `T`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CategoryMap<T> {
    values: [T; Category::COUNT],
}

impl<T> CategoryMap<T> {
    pub fn from_fn(mut f: impl FnMut(Category) -> T) -> Self {
        Self {
            values: Category::ALL.map(&mut f),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Category, &T)> + '_ {
        Category::ALL.into_iter().zip(self.values.iter())
    }
}

impl CategoryMap<u32> {
    pub fn is_all_zero(&self) -> bool {
        self.values.iter().all(|v| *v == 0)
    }

    pub fn total(&self) -> u64 {
        self.values.iter().map(|v| u64::from(*v)).sum()
    }
}

impl<T> Index<Category> for CategoryMap<T> {
    type Output = T;

    fn index(&self, category: Category) -> &T {
        &self.values[category.index()]
    }
}

impl<T> IndexMut<Category> for CategoryMap<T> {
    fn index_mut(&mut self, category: Category) -> &mut T {
        &mut self.values[category.index()]
    }
}

/// Later pairs overwrite earlier ones; missing categories keep `T::default()`.
impl<T: Default> FromIterator<(Category, T)> for CategoryMap<T> {
    fn from_iter<I: IntoIterator<Item = (Category, T)>>(iter: I) -> Self {
        let mut map = CategoryMap::from_fn(|_| T::default());
        for (category, value) in iter {
            map[category] = value;
        }
        map
    }
}

impl<T: Serialize> Serialize for CategoryMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, T: Deserialize<'de> + Default> Deserialize<'de> for CategoryMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<Category, T>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}

/// One observed installation. Records equal in every field are duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstallRecord {
    pub application_id: u64,
    pub device_id: u64,
    pub user_id: u64,
    pub category: Category,
}

impl InstallRecord {
    pub fn new(application_id: u64, device_id: u64, user_id: u64, category: Category) -> Self {
        Self {
            application_id,
            device_id,
            user_id,
            category,
        }
    }
}

/// Caps that bound what a single license may cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRule {
    /// Maximum installs one license covers across all categories
    pub total_max_install: u32,
    /// Maximum installs one license covers within each category
    #[serde(default)]
    pub max_install_per_category: CategoryMap<u32>,
}

impl LicenseRule {
    pub fn new(total_max_install: u32, caps: impl IntoIterator<Item = (Category, u32)>) -> Self {
        Self {
            total_max_install,
            max_install_per_category: caps.into_iter().collect(),
        }
    }

    pub fn cap(&self, category: Category) -> u32 {
        self.max_install_per_category[category]
    }

    /// Returns the first reason this rule cannot be used, if any.
    pub fn validate(&self) -> Result<(), RuleViolation> {
        if self.total_max_install == 0 || self.max_install_per_category.is_all_zero() {
            return Err(RuleViolation::NoInstallAllowed);
        }

        for (category, &cap) in self.max_install_per_category.iter() {
            if cap > self.total_max_install {
                return Err(RuleViolation::CategoryCapExceedsTotal {
                    category,
                    cap,
                    total: self.total_max_install,
                });
            }
        }

        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// Outstanding installs per category owed to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemandSummary {
    pub user_id: u64,
    pub counts: CategoryMap<u32>,
}

impl DemandSummary {
    pub fn new(user_id: u64, counts: CategoryMap<u32>) -> Self {
        Self { user_id, counts }
    }

    pub fn empty(user_id: u64) -> Self {
        Self::new(user_id, CategoryMap::default())
    }

    pub fn count(&self, category: Category) -> u32 {
        self.counts[category]
    }

    pub fn total_installs(&self) -> u64 {
        self.counts.total()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_all_zero()
    }
}
