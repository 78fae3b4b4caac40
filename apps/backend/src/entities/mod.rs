pub mod captions;
pub mod players;
pub mod rounds;
pub mod sessions;

pub use captions::Entity as Captions;
pub use captions::Model as CaptionRow;
pub use players::Entity as Players;
pub use players::Model as PlayerRow;
pub use rounds::Entity as Rounds;
pub use rounds::Model as RoundRow;
pub use sessions::Entity as Sessions;
pub use sessions::Model as SessionRow;
