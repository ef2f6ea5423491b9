/*
[INPUT]:  Remote layer list
[OUTPUT]: Cached, filtered layers and connectable layer lookup
[POS]:    Layer registry module wiring
[UPDATE]: When registry exports change
*/

pub mod registry;

pub use registry::{LayerRegistry, coming_soon_layers, selectable_layers};
