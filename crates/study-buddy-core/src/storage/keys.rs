//! Registry of persisted key names.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    LastSessionLog,
    LastSessionDate,
    CurrentStreak,
    TotalFocusTime,
    LastNotifAction,
    AdaptiveModel,
    RewardsBalance,
    RewardsTransactions,
    RewardsRedemptions,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::LastSessionLog => "lastSessionLog",
            StorageKey::LastSessionDate => "lastSessionDate",
            StorageKey::CurrentStreak => "currentStreak",
            StorageKey::TotalFocusTime => "totalFocusTime",
            StorageKey::LastNotifAction => "lastNotifAction",
            StorageKey::AdaptiveModel => "adaptiveModel",
            StorageKey::RewardsBalance => "rewards:balance",
            StorageKey::RewardsTransactions => "rewards:transactions",
            StorageKey::RewardsRedemptions => "rewards:redemptions",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
