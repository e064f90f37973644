use std::rc::Rc;

use clap::Subcommand;
use serde_json::json;
use study_buddy_core::catalog::REWARD_CATALOG;
use study_buddy_core::clock::SystemClock;
use study_buddy_core::{Database, RewardLedger};

#[derive(Subcommand)]
pub enum RewardsAction {
    /// Current token balance
    Balance,
    /// Transactions and redemptions, newest first
    History {
        /// Show at most this many entries of each list
        #[arg(long, default_value = "20")]
        limit: usize,
    },
    /// Items that can be redeemed
    Catalog,
    /// Spend tokens on a catalog item
    Redeem {
        /// Item ID (e.g. "confetti")
        item_id: String,
    },
}

pub fn run(action: RewardsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Rc::new(Database::open()?);
    let ledger = RewardLedger::new(db, Rc::new(SystemClock));

    match action {
        RewardsAction::Balance => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "balance": ledger.balance() }))?
            );
        }
        RewardsAction::History { limit } => {
            let mut transactions = ledger.transactions();
            transactions.truncate(limit);
            let mut redemptions = ledger.redemptions();
            redemptions.truncate(limit);
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "transactions": transactions,
                    "redemptions": redemptions,
                }))?
            );
        }
        RewardsAction::Catalog => {
            println!("{}", serde_json::to_string_pretty(&REWARD_CATALOG)?);
        }
        RewardsAction::Redeem { item_id } => {
            let (redemption, balance) = ledger.redeem_tokens(&item_id)?;
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "redemption": redemption,
                    "balance": balance,
                }))?
            );
        }
    }
    Ok(())
}
