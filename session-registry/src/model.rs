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

//! Session-side registration model shared by the stores and the lifecycle.

use datum_cache::{Publisher, SourceAddress};

/// How wide a subscriber wants its view of the service data to be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SubscriberScope {
    #[default]
    Zone,
    DataCenter,
    Global,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Subscriber {
    pub register_id: String,
    pub data_info_id: String,
    pub source_address: SourceAddress,
    pub scope: SubscriberScope,
}

impl Subscriber {
    /// The connection identity this subscriber registered through.
    pub fn connect_id(&self) -> String {
        self.source_address.address_string()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Watcher {
    pub register_id: String,
    pub data_info_id: String,
    pub source_address: SourceAddress,
}

impl Watcher {
    pub fn connect_id(&self) -> String {
        self.source_address.address_string()
    }
}

/// A registration request, discriminated by the kind of party registering.
/// The lifecycle dispatches on the variant.
#[derive(Clone, Debug)]
pub enum StoreData {
    Publisher(Publisher),
    Subscriber(Subscriber),
    Watcher(Watcher),
}

impl StoreData {
    pub fn register_id(&self) -> &str {
        match self {
            StoreData::Publisher(publisher) => publisher.register_id(),
            StoreData::Subscriber(subscriber) => &subscriber.register_id,
            StoreData::Watcher(watcher) => &watcher.register_id,
        }
    }

    pub fn data_info_id(&self) -> &str {
        match self {
            StoreData::Publisher(publisher) => publisher.data_info_id(),
            StoreData::Subscriber(subscriber) => &subscriber.data_info_id,
            StoreData::Watcher(watcher) => &watcher.data_info_id,
        }
    }

    pub fn source_address(&self) -> &SourceAddress {
        match self {
            StoreData::Publisher(publisher) => publisher.source_address(),
            StoreData::Subscriber(subscriber) => &subscriber.source_address,
            StoreData::Watcher(watcher) => &watcher.source_address,
        }
    }
}
