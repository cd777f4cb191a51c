//! Payment orchestration.
//!
//! The booking fee can be satisfied four ways: entirely from the wallet,
//! partly from the wallet with the remainder owed to an external gateway,
//! a silently wallet-covered pay-at-hotel advance, or entirely via the
//! gateway. Inputs are first classified into one `PaymentIntent` variant
//! so every {method, wallet-usage} combination is an explicit arm rather
//! than a fallthrough.
//!
//! Planning is pure. The booking service reads the wallet balance, asks
//! for a plan, and applies the resulting debit in the same transaction as
//! the booking insert.

use serde::Deserialize;

use crate::domain::{twenty_percent, BookingFeeStatus, PaymentMethod, WalletOptions};
use crate::error::{AppError, Result};

/// What to do when an explicit wallet_amount exceeds the balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WalletShortfallPolicy {
    /// Debit whatever is available and bill the rest to the gateway.
    #[default]
    Cap,
    /// Refuse the booking outright.
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentIntent {
    /// method == Wallet: the wallet must cover the full amount.
    FullWallet,
    /// Explicit wallet participation alongside another method.
    WalletAssisted {
        method: PaymentMethod,
        requested: i64,
    },
    /// Pay-at-hotel with no explicit wallet use: the advance is covered
    /// from the wallet when it can be, silently.
    AutoAdvance,
    /// Everything owed to the external gateway.
    Gateway { method: PaymentMethod },
}

impl PaymentIntent {
    pub fn classify(method: PaymentMethod, wallet: &WalletOptions) -> Self {
        let requested = wallet.wallet_amount.unwrap_or(0);
        match method {
            PaymentMethod::Wallet => PaymentIntent::FullWallet,
            _ if wallet.use_wallet_balance && requested > 0 => PaymentIntent::WalletAssisted {
                method,
                requested,
            },
            PaymentMethod::PayAtHotel => PaymentIntent::AutoAdvance,
            _ => PaymentIntent::Gateway { method },
        }
    }
}

/// The orchestrator's verdict: how much to debit now, whether the fee is
/// settled, and whether the caller must redirect to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentPlan {
    pub booking_fee: i64,
    pub advance_amount: i64,
    pub fee_status: BookingFeeStatus,
    pub requires_payment: bool,
    pub wallet_deduction: i64,
}

impl PaymentPlan {
    pub fn wallet_payment_success(&self) -> bool {
        self.wallet_deduction > 0
    }

    /// Remainder the gateway must collect when `requires_payment` holds.
    pub fn gateway_amount(&self) -> i64 {
        if self.requires_payment {
            self.booking_fee - self.wallet_deduction
        } else {
            0
        }
    }
}

pub fn plan(
    method: PaymentMethod,
    total_amount: i64,
    wallet_balance: i64,
    wallet: &WalletOptions,
    shortfall: WalletShortfallPolicy,
) -> Result<PaymentPlan> {
    let booking_fee = method.booking_fee(total_amount);
    let advance_amount = twenty_percent(total_amount);

    let plan = match PaymentIntent::classify(method, wallet) {
        PaymentIntent::FullWallet => {
            if wallet_balance < total_amount {
                return Err(AppError::InsufficientFunds(format!(
                    "wallet balance {} does not cover booking amount {}",
                    wallet_balance, total_amount
                )));
            }
            PaymentPlan {
                booking_fee,
                advance_amount,
                fee_status: BookingFeeStatus::Paid,
                requires_payment: false,
                wallet_deduction: total_amount,
            }
        }

        PaymentIntent::WalletAssisted { method, requested } => {
            if matches!(shortfall, WalletShortfallPolicy::Reject) && requested > wallet_balance {
                return Err(AppError::InsufficientFunds(format!(
                    "requested wallet amount {} exceeds balance {}",
                    requested, wallet_balance
                )));
            }
            // Debit up to the available balance, never past the total
            // stay cost. A pay-at-hotel guest may prepay more than the
            // advance this way.
            let deduction = requested.min(wallet_balance).min(total_amount);
            match method {
                PaymentMethod::PayAtHotel => {
                    let settled = deduction >= advance_amount;
                    PaymentPlan {
                        booking_fee,
                        advance_amount,
                        fee_status: if settled {
                            BookingFeeStatus::Paid
                        } else {
                            BookingFeeStatus::Pending
                        },
                        requires_payment: !settled,
                        wallet_deduction: deduction,
                    }
                }
                // Online methods always route the remainder through the
                // gateway, even a zero remainder. Settling a fully
                // wallet-covered fee without a redirect is a known
                // policy question; current policy keeps the redirect.
                _ => PaymentPlan {
                    booking_fee,
                    advance_amount,
                    fee_status: BookingFeeStatus::Pending,
                    requires_payment: true,
                    wallet_deduction: deduction,
                },
            }
        }

        PaymentIntent::AutoAdvance => {
            if wallet_balance >= advance_amount {
                PaymentPlan {
                    booking_fee,
                    advance_amount,
                    fee_status: BookingFeeStatus::Paid,
                    requires_payment: false,
                    wallet_deduction: advance_amount,
                }
            } else {
                PaymentPlan {
                    booking_fee,
                    advance_amount,
                    fee_status: BookingFeeStatus::Pending,
                    requires_payment: true,
                    wallet_deduction: 0,
                }
            }
        }

        PaymentIntent::Gateway { .. } => PaymentPlan {
            booking_fee,
            advance_amount,
            fee_status: BookingFeeStatus::Pending,
            requires_payment: true,
            wallet_deduction: 0,
        },
    };

    Ok(plan)
}
