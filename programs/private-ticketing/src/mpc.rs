//! Plumbing between the program and the Arcium MXE: argument packing,
//! computation queueing and callback authentication.

use anchor_lang::prelude::*;
use anchor_lang::solana_program::sysvar::instructions::{
    get_instruction_relative, ID as INSTRUCTIONS_SYSVAR_ID,
};
use arcium_client::idl::arcium::cpi::{accounts::QueueComputation, queue_computation};
use arcium_client::idl::arcium::program::Arcium;
use arcium_client::idl::arcium::types::{
    ArgumentList, ArgumentRef, CallbackAccount, CallbackInstruction,
};
use arcium_client::pda::comp_def_offset;

use crate::constants::{EVENT_SECRET_FIELDS, SIGN_SEED};
use crate::errors::TicketingError;

pub fn split_ciphertext_128(data: [u8; 128]) -> [[u8; 32]; EVENT_SECRET_FIELDS] {
    let mut out = [[0u8; 32]; EVENT_SECRET_FIELDS];
    for (i, field) in out.iter_mut().enumerate() {
        field.copy_from_slice(&data[i * 32..(i + 1) * 32]);
    }
    out
}

pub fn join_ciphertexts(fields: [[u8; 32]; EVENT_SECRET_FIELDS]) -> [u8; 128] {
    let mut out = [0u8; 128];
    for (i, field) in fields.iter().enumerate() {
        out[i * 32..(i + 1) * 32].copy_from_slice(field);
    }
    out
}

/// Builds an `ArgumentList` in the parameter order of a circuit instruction.
pub struct ComputationArgs {
    list: ArgumentList,
}

impl ComputationArgs {
    pub fn new() -> Self {
        Self {
            list: ArgumentList {
                args: Vec::new(),
                byte_arrays: Vec::new(),
                plaintext_numbers: Vec::new(),
                values_128_bit: Vec::new(),
                accounts: Vec::new(),
            },
        }
    }

    /// `Shared` owner: the caller's x25519 key plus the nonce it encrypted with.
    pub fn shared_owner(mut self, enc_pubkey: [u8; 32], nonce: [u8; 16]) -> Self {
        self.list
            .args
            .push(ArgumentRef::ArcisPubkey(self.list.byte_arrays.len() as u8));
        self.list.byte_arrays.push(enc_pubkey);
        self.nonce(nonce)
    }

    /// `Mxe` owner: only the nonce travels with the ciphertexts.
    pub fn mxe_owner(self, nonce: [u8; 16]) -> Self {
        self.nonce(nonce)
    }

    fn nonce(mut self, nonce: [u8; 16]) -> Self {
        self.list
            .args
            .push(ArgumentRef::PlaintextU128(self.list.values_128_bit.len() as u8));
        self.list.values_128_bit.push(u128::from_le_bytes(nonce));
        self
    }

    pub fn encrypted_u64(mut self, ciphertext: [u8; 32]) -> Self {
        self.list
            .args
            .push(ArgumentRef::EncryptedU64(self.list.byte_arrays.len() as u8));
        self.list.byte_arrays.push(ciphertext);
        self
    }

    pub fn encrypted_fields(self, fields: &[[u8; 32]]) -> Self {
        fields
            .iter()
            .fold(self, |args, field| args.encrypted_u64(*field))
    }

    pub fn plaintext_u64(mut self, value: u64) -> Self {
        self.list
            .args
            .push(ArgumentRef::PlaintextU64(self.list.plaintext_numbers.len() as u8));
        self.list.plaintext_numbers.push(value);
        self
    }

    pub fn len(&self) -> usize {
        self.list.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.args.is_empty()
    }

    pub fn build(self) -> ArgumentList {
        self.list
    }
}

impl Default for ComputationArgs {
    fn default() -> Self {
        Self::new()
    }
}

/// Callback the cluster invokes with a computation's output. `accounts` are
/// the callback's own accounts in declaration order; the instructions sysvar
/// is appended last, as every callback authenticates through it.
pub fn callback_ix(discriminator: &[u8], accounts: &[(Pubkey, bool)]) -> CallbackInstruction {
    let accounts = accounts
        .iter()
        .map(|(pubkey, is_writable)| CallbackAccount {
            pubkey: *pubkey,
            is_writable: *is_writable,
        })
        .chain(std::iter::once(CallbackAccount {
            pubkey: INSTRUCTIONS_SYSVAR_ID,
            is_writable: false,
        }))
        .collect();

    CallbackInstruction {
        program_id: crate::ID,
        discriminator: discriminator.to_vec(),
        accounts,
    }
}

/// Accounts needed to queue a computation on the Arcium program.
#[derive(Accounts)]
pub struct MxeQueue<'info> {
    /// CHECK: Sign PDA for Arcium CPI
    #[account(seeds = [SIGN_SEED], bump)]
    pub sign_seed: AccountInfo<'info>,

    pub arcium_program: Program<'info, Arcium>,
    /// CHECK: MXE account
    pub mxe_account: AccountInfo<'info>,
    /// CHECK: Cluster account
    pub cluster_account: AccountInfo<'info>,
    /// CHECK: Fee pool
    #[account(mut)]
    pub pool_account: AccountInfo<'info>,
    /// CHECK: Clock account
    pub clock_account: AccountInfo<'info>,
    /// CHECK: Mempool
    #[account(mut)]
    pub mempool_account: AccountInfo<'info>,
    /// CHECK: Executing pool
    #[account(mut)]
    pub executing_pool: AccountInfo<'info>,
    /// CHECK: Computation account
    #[account(mut)]
    pub computation_account: AccountInfo<'info>,
    /// CHECK: Comp def account
    pub comp_def_account: AccountInfo<'info>,
}

impl<'info> MxeQueue<'info> {
    #[allow(clippy::too_many_arguments)]
    pub fn queue(
        &self,
        payer: AccountInfo<'info>,
        system_program: AccountInfo<'info>,
        computation_offset: u64,
        computation: &str,
        args: ComputationArgs,
        mxe_program_id: Pubkey,
        callback: CallbackInstruction,
    ) -> Result<()> {
        let cpi_accounts = QueueComputation {
            signer: payer,
            sign_seed: self.sign_seed.to_account_info(),
            comp: self.computation_account.to_account_info(),
            mxe: self.mxe_account.to_account_info(),
            mempool: self.mempool_account.to_account_info(),
            executing_pool: self.executing_pool.to_account_info(),
            comp_def_acc: self.comp_def_account.to_account_info(),
            cluster: self.cluster_account.to_account_info(),
            pool_account: self.pool_account.to_account_info(),
            system_program,
            clock: self.clock_account.to_account_info(),
        };

        let (_, bump) = Pubkey::find_program_address(&[SIGN_SEED], &crate::ID);
        let bump_bytes = [bump];
        let seeds: &[&[u8]] = &[SIGN_SEED, &bump_bytes];
        let signer_seeds: &[&[&[u8]]] = &[seeds];
        let cpi_ctx = CpiContext::new_with_signer(
            self.arcium_program.to_account_info(),
            cpi_accounts,
            signer_seeds,
        );

        let arg_count = args.len();
        queue_computation(
            cpi_ctx,
            computation_offset,
            comp_def_offset(computation),
            None,
            args.build(),
            mxe_program_id,
            vec![callback],
            0,
            0,
            0,
        )?;

        msg!(
            "Queued {} at offset {} ({} args)",
            computation,
            computation_offset,
            arg_count
        );
        Ok(())
    }
}

/// Callbacks are only accepted from a transaction driven by the Arcium program.
pub fn require_arcium_caller(instructions_sysvar: &AccountInfo) -> Result<()> {
    let current = get_instruction_relative(0, instructions_sysvar)?;
    require_keys_eq!(
        current.program_id,
        Arcium::id(),
        TicketingError::UnauthorizedCallback
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_and_join_are_inverse() {
        let mut packed = [0u8; 128];
        for (i, byte) in packed.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let fields = split_ciphertext_128(packed);
        assert_eq!(fields[1][0], 32);
        assert_eq!(fields[3][31], 127);
        assert_eq!(join_ciphertexts(fields), packed);
    }

    #[test]
    fn test_shared_owner_contributes_pubkey_and_nonce() {
        let args = ComputationArgs::new()
            .shared_owner([7; 32], [1; 16])
            .encrypted_fields(&[[2; 32], [3; 32], [4; 32]]);
        assert_eq!(args.len(), 5);

        let list = args.build();
        assert_eq!(list.byte_arrays.len(), 4);
        assert_eq!(list.byte_arrays[0], [7; 32]);
        assert_eq!(list.values_128_bit, vec![u128::from_le_bytes([1; 16])]);
    }

    #[test]
    fn test_callback_ix_appends_instructions_sysvar() {
        let event = Pubkey::new_unique();
        let ix = callback_ix(&[1, 2, 3, 4, 5, 6, 7, 8], &[(event, true)]);

        assert_eq!(ix.program_id, crate::ID);
        assert_eq!(ix.discriminator, vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(ix.accounts.len(), 2);
        assert_eq!(ix.accounts[0].pubkey, event);
        assert!(ix.accounts[0].is_writable);
        assert_eq!(ix.accounts[1].pubkey, INSTRUCTIONS_SYSVAR_ID);
        assert!(!ix.accounts[1].is_writable);
    }

    #[test]
    fn test_plaintext_numbers_are_collected_separately() {
        let list = ComputationArgs::new()
            .mxe_owner([0; 16])
            .encrypted_u64([5; 32])
            .plaintext_u64(42)
            .build();
        assert_eq!(list.args.len(), 3);
        assert_eq!(list.byte_arrays.len(), 1);
        assert_eq!(list.plaintext_numbers, vec![42]);
    }
}
