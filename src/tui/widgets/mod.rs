pub mod cards;
pub mod header;
pub mod iqamah;
pub mod prayers;
pub mod redirect;
pub mod statusbar;
