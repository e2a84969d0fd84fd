use anchor_lang::prelude::*;

use crate::constants::OWNER_TICKETS_SEED;
use crate::state::OwnerTickets;

#[derive(Accounts)]
pub struct GetMyTicketIds<'info> {
    pub owner: Signer<'info>,

    /// CHECK: owner's ticket index, absent until their first purchase
    #[account(seeds = [OWNER_TICKETS_SEED, owner.key().as_ref()], bump)]
    pub owner_tickets: UncheckedAccount<'info>,
}

/// Ids of the tickets the signer currently holds, returned as return data.
pub fn get_my_ticket_ids(ctx: Context<GetMyTicketIds>) -> Result<Vec<u64>> {
    let info = ctx.accounts.owner_tickets.to_account_info();
    if info.owner != &crate::ID || info.data_is_empty() {
        return Ok(Vec::new());
    }
    let data = info.try_borrow_data()?;
    let book = OwnerTickets::try_deserialize(&mut &data[..])?;
    Ok(book.ticket_ids)
}
