/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Read-through cache invalidation contract consumed by the change detector.

use std::fmt;
use std::fmt::{Display, Formatter};

/// Key of one datum in the session's read-through cache.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DatumKey {
    pub data_info_id: String,
    pub data_center: String,
}

impl Display for DatumKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.data_info_id, self.data_center)
    }
}

/// Session-local cache of data-tier reads. The change detector invalidates
/// an entry whenever the data tier's version for it has advanced.
pub trait SessionCacheService: Send + Sync {
    fn invalidate(&self, key: &DatumKey);
}
