//! Credit package catalog.
//!
//! The catalog is the exchange rate between money and credits. It is fixed
//! at deploy time; pricing changes require a redeploy.

use serde::{Deserialize, Serialize};

/// A purchasable credit package.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    /// Stable package identifier (`basic`, `popular`, ...).
    pub id: String,

    /// Display name.
    pub name: String,

    /// Base credits granted on settlement.
    pub credits: i64,

    /// Extra bonus credits, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus: Option<i64>,

    /// Price in whole currency units.
    pub price: i64,

    /// ISO currency code.
    pub currency: String,

    /// Highlighted in the UI as the recommended package.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub popular: bool,

    /// Short marketing blurb.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Package {
    /// Total credits granted on settlement (base + bonus).
    #[must_use]
    pub fn total_credits(&self) -> i64 {
        self.credits + self.bonus.unwrap_or(0)
    }
}

/// The static package catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    packages: Vec<Package>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            packages: vec![
                Package {
                    id: "basic".into(),
                    name: "Básico".into(),
                    credits: 10,
                    bonus: None,
                    price: 99,
                    currency: "ARS".into(),
                    popular: false,
                    description: Some("Perfecto para empezar".into()),
                },
                Package {
                    id: "popular".into(),
                    name: "Popular".into(),
                    credits: 25,
                    bonus: Some(5),
                    price: 199,
                    currency: "ARS".into(),
                    popular: true,
                    description: Some("El más elegido + 5 créditos bonus".into()),
                },
                Package {
                    id: "premium".into(),
                    name: "Premium".into(),
                    credits: 50,
                    bonus: Some(15),
                    price: 349,
                    currency: "ARS".into(),
                    popular: false,
                    description: Some("Máximo valor + 15 créditos bonus".into()),
                },
                Package {
                    id: "mega".into(),
                    name: "Mega Pack".into(),
                    credits: 100,
                    bonus: Some(35),
                    price: 599,
                    currency: "ARS".into(),
                    popular: false,
                    description: Some("Para usuarios VIP + 35 créditos bonus".into()),
                },
            ],
        }
    }
}

impl Catalog {
    /// Look up a package by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Package> {
        self.packages.iter().find(|p| p.id == id)
    }

    /// All packages, in display order.
    #[must_use]
    pub fn all(&self) -> &[Package] {
        &self.packages
    }
}
