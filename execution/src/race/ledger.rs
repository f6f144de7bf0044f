//! Bankroll and bet settlement.

use ghostrace_types::{ordinal, Bet, BetError, FinishOrder, Outcome, RacerCatalog, Settlement};
use tracing::{debug, warn};

/// Winnings for a successful bet: `amount × odds`, rounded half away from zero.
pub fn payout(amount: i64, odds: f64) -> i64 {
    (amount as f64 * odds).round() as i64
}

/// Holds the bankroll. Only [BettingLedger::settle] changes it.
///
/// The bankroll may go to zero or below; gating further bets on that is
/// the session's concern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BettingLedger {
    bankroll: i64,
}

impl BettingLedger {
    pub fn new(bankroll: i64) -> Self {
        Self { bankroll }
    }

    pub fn bankroll(&self) -> i64 {
        self.bankroll
    }

    /// Validate a bet. Nothing is deducted until the race settles.
    pub fn place_bet(
        &self,
        catalog: &RacerCatalog,
        racer_id: &str,
        amount: i64,
    ) -> Result<Bet, BetError> {
        if catalog.get(racer_id).is_none() {
            return Err(BetError::InvalidRacer(racer_id.to_string()));
        }
        if amount <= 0 {
            return Err(BetError::InvalidAmount);
        }
        if amount > self.bankroll {
            return Err(BetError::InsufficientFunds {
                amount,
                bankroll: self.bankroll,
            });
        }
        debug!(racer = racer_id, amount, "bet validated");
        Ok(Bet {
            racer_id: racer_id.to_string(),
            amount,
        })
    }

    /// Apply a bet against a finish order.
    ///
    /// Each call moves the bankroll, so the caller must settle a bet at most
    /// once.
    pub fn settle(&mut self, bet: Option<&Bet>, order: &FinishOrder) -> Settlement {
        let Some(bet) = bet else {
            return Settlement::no_bet();
        };

        let winner = order.winner();
        if winner.id == bet.racer_id {
            let won = payout(bet.amount, winner.odds);
            self.bankroll = self.bankroll.saturating_add(won);
            return Settlement {
                delta: won,
                narrative: format!(
                    "WIN! You bet {} on {} at {:.1}x and won {}.",
                    bet.amount, winner.name, winner.odds, won
                ),
                outcome: Outcome::Win {
                    racer_id: bet.racer_id.clone(),
                    amount: bet.amount,
                    odds: winner.odds,
                    payout: won,
                },
            };
        }

        self.bankroll = self.bankroll.saturating_sub(bet.amount);
        let backed = order
            .ranked()
            .iter()
            .enumerate()
            .find(|(_, racer)| racer.id == bet.racer_id);
        let (position, narrative) = match backed {
            Some((index, racer)) => (
                Some(index + 1),
                format!(
                    "LOSS. You bet {} on {}, who finished {}.",
                    bet.amount,
                    racer.name,
                    ordinal(index + 1)
                ),
            ),
            None => {
                warn!(racer = %bet.racer_id, "settled a bet on a racer missing from the finish order");
                (
                    None,
                    format!(
                        "LOSS. You bet {} on {}, who did not finish.",
                        bet.amount, bet.racer_id
                    ),
                )
            }
        };
        Settlement {
            delta: -bet.amount,
            narrative,
            outcome: Outcome::Loss {
                racer_id: bet.racer_id.clone(),
                amount: bet.amount,
                position,
            },
        }
    }
}
