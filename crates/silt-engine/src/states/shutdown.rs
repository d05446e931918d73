//! Terminal state. Entering it raises the shutdown flag; the main loop
//! and transport observe the flag and wind down on their own paths.

use std::sync::atomic::Ordering;

use tracing::info;

use crate::machine::MachineCtx;

pub(crate) fn on_enter(ctx: &mut MachineCtx) {
    info!("shutdown: raising exit flag");
    ctx.shutdown.store(true, Ordering::Release);
    // The world died with the previous state; drop the cached copy too.
    ctx.snapshot.clear();
}
