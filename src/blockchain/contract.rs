//! Gateway contract ABI and call encoding.
//!
//! The gateway wraps native ETH for the lending pool: `depositETH` is payable
//! and carries the amount as value, `withdrawETH` pulls the amount back out of
//! the pool to `to`.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// ETH gateway in front of the lending pool.
    interface IWrappedTokenGateway {
        #[derive(Debug)]
        function depositETH(address lendingPool, address onBehalfOf, uint16 referralCode) external payable;

        #[derive(Debug)]
        function withdrawETH(address lendingPool, uint256 amount, address to) external;
    }
}

/// The two calls the cycler alternates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxKind {
    Deposit,
    Withdraw,
}

impl TxKind {
    /// Lowercase label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Deposit => "deposit",
            TxKind::Withdraw => "withdraw",
        }
    }
}

impl std::fmt::Display for TxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxKind::Deposit => write!(f, "Deposit"),
            TxKind::Withdraw => write!(f, "Withdraw"),
        }
    }
}

/// An encoded contract call ready to be turned into a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub value: U256,
    pub input: Bytes,
}

/// Binding of the gateway to a lending pool and an account.
#[derive(Debug, Clone)]
pub struct GatewayBinding {
    gateway: Address,
    lending_pool: Address,
    /// Deposit beneficiary and withdraw recipient.
    account: Address,
    referral_code: u16,
}

impl GatewayBinding {
    pub fn new(gateway: Address, lending_pool: Address, account: Address, referral_code: u16) -> Self {
        Self {
            gateway,
            lending_pool,
            account,
            referral_code,
        }
    }

    /// Encode a `depositETH` call moving `amount` wei into the pool.
    pub fn deposit(&self, amount: U256) -> ContractCall {
        let input = IWrappedTokenGateway::depositETHCall {
            lendingPool: self.lending_pool,
            onBehalfOf: self.account,
            referralCode: self.referral_code,
        }
        .abi_encode();

        ContractCall {
            to: self.gateway,
            value: amount,
            input: input.into(),
        }
    }

    /// Encode a `withdrawETH` call pulling `amount` wei back to the account.
    pub fn withdraw(&self, amount: U256) -> ContractCall {
        let input = IWrappedTokenGateway::withdrawETHCall {
            lendingPool: self.lending_pool,
            amount,
            to: self.account,
        }
        .abi_encode();

        ContractCall {
            to: self.gateway,
            value: U256::ZERO,
            input: input.into(),
        }
    }

    /// Encode the call for `kind`.
    pub fn call(&self, kind: TxKind, amount: U256) -> ContractCall {
        match kind {
            TxKind::Deposit => self.deposit(amount),
            TxKind::Withdraw => self.withdraw(amount),
        }
    }

    /// The account deposits are credited to and withdrawals are paid to.
    pub fn account(&self) -> Address {
        self.account
    }
}
