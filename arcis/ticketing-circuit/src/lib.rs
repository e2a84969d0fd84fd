//! Arcium encrypted instructions for private event ticketing.
//!
//! Event secrets (price, supply, sold count, resale markup) only ever exist
//! as secret shares inside the MXE. Each instruction re-encrypts what it
//! returns either to the cluster (`Mxe`) or to one user (`Shared`).
//!
//! Built with the Arcium toolchain, outside the cargo workspace.

use arcis::*;

#[encrypted]
mod circuits {
    use arcis::*;

    /// What the organizer encrypts when creating an event
    pub struct EventInput {
        pub price: u64,
        pub supply: u64,
        /// Resale markup in percent
        pub markup: u64,
    }

    /// Field order matches the four ciphertexts stored on the event account
    pub struct EventBook {
        pub price: u64,
        pub supply: u64,
        pub sold: u64,
        pub markup: u64,
    }

    /// Take over the organizer's inputs with nothing sold yet
    #[instruction]
    pub fn init_event(input_ctxt: Enc<Shared, EventInput>) -> Enc<Mxe, EventBook> {
        let input = input_ctxt.to_arcis();
        let book = EventBook {
            price: input.price,
            supply: input.supply,
            sold: 0,
            markup: input.markup,
        };
        Mxe.from_arcis(book)
    }

    /// Sell one ticket if sold < supply. Only the yes/no outcome is revealed;
    /// the price is copied, still encrypted, onto the ticket.
    #[instruction]
    pub fn purchase_ticket(
        book_ctxt: Enc<Mxe, EventBook>,
    ) -> (bool, Enc<Mxe, EventBook>, Enc<Mxe, u64>) {
        let mut book = book_ctxt.to_arcis();
        let available = book.sold < book.supply;
        if available {
            book.sold += 1;
        }
        let price = book.price;

        (
            available.reveal(),
            book_ctxt.owner.from_arcis(book),
            book_ctxt.owner.from_arcis(price),
        )
    }

    /// Ticket id encrypted for the holder; decrypting it proves key ownership
    #[instruction]
    pub fn prove_ownership(holder: Shared, ticket_id: u64) -> Enc<Shared, u64> {
        holder.from_arcis(ticket_id)
    }

    #[instruction]
    pub fn reveal_ticket_price(
        holder: Shared,
        price_ctxt: Enc<Mxe, u64>,
        ticket_id: u64,
    ) -> (u64, Enc<Shared, u64>) {
        let price = price_ctxt.to_arcis();
        (ticket_id, holder.from_arcis(price))
    }

    /// Highest allowed resale price: purchase price plus the event's markup
    #[instruction]
    pub fn quote_resale(
        holder: Shared,
        price_ctxt: Enc<Mxe, u64>,
        book_ctxt: Enc<Mxe, EventBook>,
        ticket_id: u64,
    ) -> (u64, Enc<Shared, u64>) {
        let price = price_ctxt.to_arcis();
        let book = book_ctxt.to_arcis();
        let quote = price * (100 + book.markup) / 100;
        (ticket_id, holder.from_arcis(quote))
    }

    #[instruction]
    pub fn reveal_sales(
        organizer: Shared,
        book_ctxt: Enc<Mxe, EventBook>,
        event_id: u64,
    ) -> (u64, Enc<Shared, u64>) {
        let book = book_ctxt.to_arcis();
        (event_id, organizer.from_arcis(book.sold))
    }
}
