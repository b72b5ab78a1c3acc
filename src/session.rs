pub mod card_session;
pub mod color_cell;
