//! A 2-of-2 wallet administering a token contract

use multisig_custody::crypto::Address;
use multisig_custody::ledger::{CallContext, Chain, Contract};
use multisig_custody::multisig::{
    CallFailure, ExecutionOutcome, MultisigWallet, WalletConfig, WalletEvent,
};
use multisig_custody::token::{ManagedToken, TokenCall, TokenMetadata};
use multisig_custody::CallError;
use std::any::Any;

const DEPOSIT: u128 = 10_000_000;
const AMOUNT: u128 = 1_000_000;

/// Mints on the token for `beneficiary`, then reverts
#[derive(Clone)]
struct MintThenRevert {
    token: Address,
    beneficiary: Address,
}

impl Contract for MintThenRevert {
    fn handle(&mut self, ctx: &mut CallContext<'_>, _data: &[u8]) -> Result<(), CallError> {
        let mint = TokenCall::Mint {
            to: self.beneficiary,
            amount: AMOUNT,
        }
        .encode();
        ctx.call(&self.token, 0, &mint)?;
        Err(CallError::Reverted("late failure".to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct Fixture {
    wallet: MultisigWallet,
    token: Address,
    chain: Chain,
    accounts: Vec<Address>,
}

impl Fixture {
    fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();

        let accounts: Vec<Address> = (0..3)
            .map(|i| Address::from_label(&format!("account-{}", i)))
            .collect();
        let config = WalletConfig::new(accounts[..2].to_vec(), 2).unwrap();
        let wallet = MultisigWallet::new(config).unwrap();

        let mut chain = Chain::new();
        chain.fund(&accounts[0], DEPOSIT + 1_000).unwrap();

        let metadata =
            TokenMetadata::new("Test Token".to_string(), "TST".to_string(), 18).unwrap();
        let token = chain.deploy(&accounts[0], ManagedToken::new(metadata, accounts[0]));

        // Send money to wallet
        wallet.deposit(accounts[0], DEPOSIT, &mut chain).unwrap();
        assert_eq!(wallet.balance(&chain), DEPOSIT);

        Self {
            wallet,
            token,
            chain,
            accounts,
        }
    }

    /// Direct call to the token from account 0, bypassing the wallet
    fn call_token(&mut self, value: u128, call: Option<TokenCall>) {
        let data = call.map(|c| c.encode()).unwrap_or_default();
        let sender = self.accounts[0];
        self.chain.call(&sender, &self.token, value, &data).unwrap();
    }

    fn hand_token_to_wallet(&mut self) {
        let wallet = self.wallet.address();
        self.call_token(0, Some(TokenCall::TransferOwnership(wallet)));
    }

    fn token_balance(&self, holder: &Address) -> u128 {
        self.chain
            .contract::<ManagedToken>(&self.token)
            .unwrap()
            .balance_of(holder)
    }

    fn submit(&mut self, call: TokenCall) -> u64 {
        let before = self.wallet.events().len() as u64;
        let id = self
            .wallet
            .submit(self.accounts[0], self.token, 0, call.encode(), &mut self.chain)
            .unwrap();

        let events: Vec<WalletEvent> = self
            .wallet
            .events_since(before)
            .into_iter()
            .map(|r| r.event)
            .collect();
        assert_eq!(events[0], WalletEvent::Submission { transaction_id: id });
        id
    }

    /// Second confirmation; returns the events it produced
    fn confirm(&mut self, id: u64) -> (Option<ExecutionOutcome>, Vec<WalletEvent>) {
        let before = self.wallet.events().len() as u64;
        let outcome = self
            .wallet
            .confirm(id, self.accounts[1], &mut self.chain)
            .unwrap();
        let events = self
            .wallet
            .events_since(before)
            .into_iter()
            .map(|r| r.event)
            .collect();
        (outcome, events)
    }
}

#[test]
fn test_token_minting_requires_two_signatures() {
    let mut f = Fixture::new();
    f.hand_token_to_wallet();
    let wallet = f.wallet.address();
    let initial = f.token_balance(&wallet);

    let id = f.submit(TokenCall::Mint {
        to: wallet,
        amount: AMOUNT,
    });
    assert_eq!(f.token_balance(&wallet), initial);

    let (outcome, events) = f.confirm(id);

    assert_eq!(outcome, Some(ExecutionOutcome::Executed));
    assert!(events.contains(&WalletEvent::Execution { transaction_id: id }));
    assert_eq!(f.token_balance(&wallet), initial + AMOUNT);
}

#[test]
fn test_sending_ether_from_token_requires_two_signatures() {
    let mut f = Fixture::new();
    f.hand_token_to_wallet();
    let payee = f.accounts[2];
    let amount = 5;
    f.call_token(amount, None);

    let initial = f.chain.balance_of(&payee);
    let id = f.submit(TokenCall::SendEther { to: payee, amount });
    assert_eq!(f.chain.balance_of(&payee), initial);

    let (_, events) = f.confirm(id);

    assert!(events.contains(&WalletEvent::Execution { transaction_id: id }));
    assert_eq!(f.chain.balance_of(&payee), initial + amount);
    // Custody balance untouched: the value came from the token
    assert_eq!(f.wallet.balance(&f.chain), DEPOSIT);
}

#[test]
fn test_transfer_fails_before_enabled() {
    let mut f = Fixture::new();
    let wallet = f.wallet.address();
    f.call_token(
        0,
        Some(TokenCall::Mint {
            to: wallet,
            amount: AMOUNT,
        }),
    );

    let id = f.submit(TokenCall::Transfer {
        to: f.accounts[1],
        amount: AMOUNT,
    });
    let (outcome, events) = f.confirm(id);

    assert!(matches!(
        outcome,
        Some(ExecutionOutcome::Failed(CallFailure::Call(CallError::Reverted(_))))
    ));
    assert!(events.contains(&WalletEvent::ExecutionFailure { transaction_id: id }));
    assert!(!f.wallet.transaction(id).unwrap().executed);
    assert_eq!(f.token_balance(&wallet), AMOUNT);
}

#[test]
fn test_transfer_works_after_enabled() {
    let mut f = Fixture::new();
    let wallet = f.wallet.address();
    f.call_token(
        0,
        Some(TokenCall::Mint {
            to: wallet,
            amount: AMOUNT,
        }),
    );
    f.hand_token_to_wallet();

    let enabling = f.submit(TokenCall::AllowTransfers);
    let (_, events) = f.confirm(enabling);
    assert!(events.contains(&WalletEvent::Execution {
        transaction_id: enabling
    }));

    let id = f.submit(TokenCall::Transfer {
        to: f.accounts[1],
        amount: AMOUNT,
    });
    let (_, events) = f.confirm(id);

    assert!(events.contains(&WalletEvent::Execution { transaction_id: id }));
    assert_eq!(f.token_balance(&f.accounts[1]), AMOUNT);
    assert_eq!(f.token_balance(&wallet), 0);
}

#[test]
fn test_transfer_failure_without_issuance() {
    let mut f = Fixture::new();

    let id = f.submit(TokenCall::Transfer {
        to: f.accounts[1],
        amount: AMOUNT,
    });
    let (_, events) = f.confirm(id);

    assert_eq!(
        events.last(),
        Some(&WalletEvent::ExecutionFailure { transaction_id: id })
    );
    assert_eq!(f.wallet.transaction(id).unwrap().failed_attempts, 1);
}

#[test]
fn test_failed_transfer_retried_after_enabling() {
    let mut f = Fixture::new();
    let wallet = f.wallet.address();
    f.call_token(
        0,
        Some(TokenCall::Mint {
            to: wallet,
            amount: AMOUNT,
        }),
    );

    let transfer = f.submit(TokenCall::Transfer {
        to: f.accounts[1],
        amount: AMOUNT,
    });
    let (outcome, _) = f.confirm(transfer);
    assert!(matches!(outcome, Some(ExecutionOutcome::Failed(_))));

    // Fix the precondition through the wallet itself
    f.hand_token_to_wallet();
    let enabling = f.submit(TokenCall::AllowTransfers);
    f.confirm(enabling);

    let outcome = f
        .wallet
        .execute(transfer, f.accounts[0], &mut f.chain)
        .unwrap();

    assert_eq!(outcome, ExecutionOutcome::Executed);
    assert_eq!(f.token_balance(&f.accounts[1]), AMOUNT);
    let tx = f.wallet.transaction(transfer).unwrap();
    assert!(tx.executed);
    assert_eq!(tx.failed_attempts, 1);
    assert!(f.wallet.execute(transfer, f.accounts[0], &mut f.chain).is_err());
}

#[test]
fn test_failed_execution_leaves_no_token_side_effects() {
    let mut f = Fixture::new();
    let wallet = f.wallet.address();
    let minter = f.chain.deploy(
        &f.accounts[0],
        MintThenRevert {
            token: f.token,
            beneficiary: wallet,
        },
    );
    f.call_token(0, Some(TokenCall::TransferOwnership(minter)));

    let id = f
        .wallet
        .submit(f.accounts[0], minter, 0, vec![], &mut f.chain)
        .unwrap();
    let outcome = f.wallet.confirm(id, f.accounts[1], &mut f.chain).unwrap();

    assert_eq!(
        outcome,
        Some(ExecutionOutcome::Failed(CallFailure::Call(
            CallError::Reverted("late failure".to_string())
        )))
    );
    assert!(!f.wallet.transaction(id).unwrap().executed);
    let token = f.chain.contract::<ManagedToken>(&f.token).unwrap();
    assert_eq!(token.total_supply(), 0);
    assert_eq!(token.balance_of(&wallet), 0);
    assert!(token.transfer_history.is_empty());

    // A retry fails the same way and still mints nothing
    let outcome = f.wallet.execute(id, f.accounts[0], &mut f.chain).unwrap();
    assert!(matches!(outcome, ExecutionOutcome::Failed(_)));
    assert_eq!(
        f.chain
            .contract::<ManagedToken>(&f.token)
            .unwrap()
            .total_supply(),
        0
    );
}
