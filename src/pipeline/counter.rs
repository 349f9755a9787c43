/// Ticket sequence number threaded through the fragment loop by value.
///
/// With no start number the counter is inert and yields `None` forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketCounter {
    next: Option<i64>,
}

impl TicketCounter {
    pub fn new(start: Option<i64>) -> Self {
        TicketCounter { next: start }
    }

    /// Take the current number and return the counter for the next fragment.
    ///
    /// Numbering stops (yields `None`) once `i64::MAX` has been handed out.
    pub fn advance(self) -> (Option<i64>, Self) {
        let next = self.next.and_then(|n| n.checked_add(1));
        (self.next, TicketCounter { next })
    }
}
