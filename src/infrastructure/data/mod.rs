// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod contracts;
pub mod db;
pub mod pool_registry;
pub mod schema;
pub mod token_manager;
