/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Property definitions, values and the per-object property bag.

mod bag;
mod definition;
mod set;
mod value;

pub use bag::PropertyBag;
pub use definition::{PropertyDefinition, PropertyDefinitionFlags};
pub use set::PropertySet;
pub use value::{PropertyKind, PropertyValue};
