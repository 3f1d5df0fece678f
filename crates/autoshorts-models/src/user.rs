//! Account profile returned by `GET /me`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Account tiers allowed to run jobs on the GPU cluster.
pub const GPU_TIERS: &[&str] = &["Pro", "Premium", "Scale", "Enterprise"];

/// Profile of the account owning the credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<String>,

    /// Remaining credit balance
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<f64>,

    /// Fields the console does not interpret, kept verbatim
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserProfile {
    /// Whether the account may select the GPU compute tier.
    pub fn gpu_eligible(&self) -> bool {
        self.tier
            .as_deref()
            .is_some_and(|tier| GPU_TIERS.contains(&tier))
    }

    pub fn email_label(&self) -> &str {
        self.email.as_deref().unwrap_or("N/A")
    }

    pub fn tier_label(&self) -> &str {
        self.tier.as_deref().unwrap_or("Pro")
    }

    /// Credit balance with thousands separators, e.g. `12,500`.
    pub fn credits_label(&self) -> String {
        let credits = self.credits.unwrap_or(0.0);
        let cents = (credits.abs() * 100.0).round() as u64;
        let digits = (cents / 100).to_string();

        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if credits < 0.0 && cents > 0 { "-" } else { "" };
        match cents % 100 {
            0 => format!("{}{}", sign, grouped),
            frac => {
                let frac = format!("{:02}", frac);
                format!("{}{}.{}", sign, grouped, frac.trim_end_matches('0'))
            }
        }
    }
}
