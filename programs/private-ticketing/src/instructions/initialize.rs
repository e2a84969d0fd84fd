use anchor_lang::prelude::*;

use crate::constants::REGISTRY_SEED;
use crate::state::Registry;

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(mut)]
    pub authority: Signer<'info>,

    #[account(
        init,
        payer = authority,
        space = 8 + Registry::INIT_SPACE,
        seeds = [REGISTRY_SEED],
        bump
    )]
    pub registry: Account<'info, Registry>,

    pub system_program: Program<'info, System>,
}

pub fn initialize(ctx: Context<Initialize>, mxe_program_id: Pubkey) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    registry.authority = ctx.accounts.authority.key();
    registry.mxe_program_id = mxe_program_id;
    registry.next_event_id = 1;
    registry.next_ticket_id = 1;
    registry.bump = ctx.bumps.registry;

    msg!(
        "Registry initialized, authority {} mxe {}",
        registry.authority,
        mxe_program_id
    );
    Ok(())
}
