use crate::foundation::core::Interval;
use crate::render::projector::CancelHandle;

/// A pending repaint: the starting resolution pair and the dirty canvas region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RepaintRequest {
    /// Screen scale index to render at.
    pub(crate) scale_index: usize,
    /// Extra mipmap levels coarser than ideal.
    pub(crate) mipmap_bias: usize,
    /// Canvas region to refresh; `None` means the whole canvas.
    pub(crate) dirty: Option<Interval>,
}

impl RepaintRequest {
    pub(crate) fn full(scale_index: usize, mipmap_bias: usize) -> Self {
        Self {
            scale_index,
            mipmap_bias,
            dirty: None,
        }
    }

    /// Combine with a newer request: the coarser targets and the union of dirty regions win.
    pub(crate) fn merge(self, newer: Self) -> Self {
        let dirty = match (self.dirty, newer.dirty) {
            (Some(a), Some(b)) => Some(a.union(b)),
            _ => None,
        };
        Self {
            scale_index: self.scale_index.max(newer.scale_index),
            mipmap_bias: self.mipmap_bias.max(newer.mipmap_bias),
            dirty,
        }
    }
}

/// Lock-protected request bookkeeping shared by trigger threads and the painter.
///
/// The request being painted stays recorded next to its cancel handle. Cancelling a pass folds
/// that request back into the pending one, so a superseded whole-canvas repaint is never
/// narrowed to a later dirty region.
#[derive(Debug, Default)]
pub(crate) struct RequestState {
    pending: Option<RepaintRequest>,
    in_flight: Option<(CancelHandle, RepaintRequest)>,
}

impl RequestState {
    /// Record `request`, merging with any pending one, and cancel the running pass.
    pub(crate) fn submit(&mut self, request: RepaintRequest) {
        let mut merged = request;
        if let Some((handle, running)) = self.in_flight.take() {
            handle.cancel();
            merged = running.merge(merged);
        }
        self.queue(merged);
    }

    /// Record a follow-up pass without cancelling anything.
    pub(crate) fn submit_followup(&mut self, request: RepaintRequest) {
        self.queue(request);
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub(crate) fn take(&mut self) -> Option<RepaintRequest> {
        self.pending.take()
    }

    /// Register `request` as the pass about to run.
    ///
    /// Returns `false` when a newer request already arrived; `request` is then merged back into
    /// the pending one.
    pub(crate) fn begin_pass(&mut self, cancel: CancelHandle, request: RepaintRequest) -> bool {
        if self.pending.is_some() {
            self.queue(request);
            return false;
        }
        self.in_flight = Some((cancel, request));
        true
    }

    pub(crate) fn end_pass(&mut self) {
        self.in_flight = None;
    }

    fn queue(&mut self, request: RepaintRequest) {
        self.pending = Some(match self.pending {
            Some(p) => p.merge(request),
            None => request,
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/request.rs"]
mod tests;
