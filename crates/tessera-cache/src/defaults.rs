//! Built-in settings served when the store holds nothing for an aggregate.
//!
//! Keeps a freshly provisioned deployment running with conservative values
//! until an operator seeds real settings.

use tessera_core::{CachePayload, SettingType, SettingsBundle, SettingsFilter};

struct DefaultSetting {
    key: &'static str,
    value: &'static str,
    setting_type: SettingType,
    category: &'static str,
    is_public: bool,
}

const DEFAULT_SETTINGS: &[DefaultSetting] = &[
    DefaultSetting {
        key: "site_name",
        value: "Tessera",
        setting_type: SettingType::String,
        category: "general",
        is_public: true,
    },
    DefaultSetting {
        key: "maintenance_mode",
        value: "false",
        setting_type: SettingType::Boolean,
        category: "general",
        is_public: true,
    },
    DefaultSetting {
        key: "default_currency",
        value: "USD",
        setting_type: SettingType::String,
        category: "general",
        is_public: true,
    },
    DefaultSetting {
        key: "registration_enabled",
        value: "true",
        setting_type: SettingType::Boolean,
        category: "features",
        is_public: true,
    },
    DefaultSetting {
        key: "live_chat_enabled",
        value: "false",
        setting_type: SettingType::Boolean,
        category: "features",
        is_public: true,
    },
    DefaultSetting {
        key: "min_bet_amount",
        value: "1",
        setting_type: SettingType::Number,
        category: "betting",
        is_public: true,
    },
    DefaultSetting {
        key: "max_bet_amount",
        value: "10000",
        setting_type: SettingType::Number,
        category: "betting",
        is_public: true,
    },
    DefaultSetting {
        key: "max_daily_deposit",
        value: "5000",
        setting_type: SettingType::Number,
        category: "payments",
        is_public: false,
    },
];

/// The default bundle restricted to rows matching `filter`.
pub fn default_bundle(filter: &SettingsFilter) -> SettingsBundle {
    DEFAULT_SETTINGS
        .iter()
        .filter(|d| filter.matches(d.key, d.category, d.is_public))
        .map(|d| (d.key.to_string(), CachePayload::new(d.value, d.setting_type)))
        .collect()
}
