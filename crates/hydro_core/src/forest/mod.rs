//! Random forest regression inference
//!
//! Each target is predicted by an independent forest of regression trees.
//! A prediction is the arithmetic mean of the leaf values reached in every
//! tree, summed in tree order.
//!
//! # Model Format
//!
//! Models are serialized as canonical JSON with sorted keys:
//!
//! ```json
//! {
//!   "estimators": [
//!     {
//!       "feature_importances": [0.02, 0.01, 0.0, 0.0, 0.31, 0.66],
//!       "n_features": 6,
//!       "trees": [
//!         {
//!           "nodes": [
//!             {"feature_idx":5,"id":0,"leaf":null,"left":1,"right":2,"threshold":2.5},
//!             {"feature_idx":-1,"id":1,"leaf":95.0,"left":-1,"right":-1,"threshold":0.0},
//!             {"feature_idx":-1,"id":2,"leaf":118.5,"left":-1,"right":-1,"threshold":0.0}
//!           ]
//!         }
//!       ]
//!     }
//!   ],
//!   "feature_columns": ["Temperature", "..."],
//!   "target_columns": ["Predicted_Cultivation_Days", "..."],
//!   "version": 1
//! }
//! ```

pub mod model;
pub mod tree;

pub use model::{MultiOutputForest, RandomForest, MODEL_VERSION};
pub use tree::{Node, Tree};
