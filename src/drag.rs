use crate::geometry::{CoordinateMapper, Point};
use crate::layout::FloorLayout;

/// Zone repositioning gesture state.
#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Idle,
    /// `offset` is the pointer position relative to the zone center.
    Dragging { zone_id: String, offset: Point },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up,
    Cancel,
}

/// Request for the owner of the graph to move a zone. Coordinates are in
/// the normalized 0..100 venue space.
#[derive(Debug, Clone, PartialEq)]
pub enum DragRequest {
    MoveZone { zone_id: String, x: f32, y: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DragMachine {
    state: DragState,
}

impl Default for DragMachine {
    fn default() -> Self {
        Self {
            state: DragState::Idle,
        }
    }
}

impl DragMachine {
    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn handle(
        &mut self,
        event: PointerEvent,
        layout: &FloorLayout,
        mapper: &CoordinateMapper,
    ) -> Option<DragRequest> {
        let (next, request) = match (&self.state, event) {
            (DragState::Idle, PointerEvent::Down(p)) => {
                let next = layout.hit_test(p).map(|zone| DragState::Dragging {
                    zone_id: zone.id.clone(),
                    offset: p.offset_from(zone.center()),
                });
                (next, None)
            }
            (DragState::Dragging { zone_id, offset }, PointerEvent::Move(p)) => {
                let center = Point::new(p.x - offset.x, p.y - offset.y);
                let (x, y) = mapper.to_normalized(center);
                let request = DragRequest::MoveZone {
                    zone_id: zone_id.clone(),
                    x: x.clamp(0.0, 100.0),
                    y: y.clamp(0.0, 100.0),
                };
                (None, Some(request))
            }
            (DragState::Dragging { .. }, PointerEvent::Up | PointerEvent::Cancel) => {
                (Some(DragState::Idle), None)
            }
            _ => (None, None),
        };

        if let Some(next) = next {
            self.state = next;
        }
        request
    }
}
