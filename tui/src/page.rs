/// The active screen of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Splash,
    Shop,
    Cart,
    Subscribe,
    Shipping,
    Payment,
    Confirm,
    FinalSubscribe,
    Final,
    Account,
    Menu,
}

impl Page {
    pub fn is_checkout(self) -> bool {
        matches!(
            self,
            Page::Cart | Page::Subscribe | Page::Shipping | Page::Payment | Page::Confirm
        )
    }

    /// Pages where the cart is on screen and may have been edited optimistically.
    pub fn is_browsing(self) -> bool {
        matches!(self, Page::Shop | Page::Cart)
    }
}
