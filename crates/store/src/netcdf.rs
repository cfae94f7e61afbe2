use catalog::netcdf::{NetCdfFrames, Resampling};
use foundation::ids::{LayerId, LayerKey, LayerKind};
use runtime::event_bus::StoreEvent;

use crate::state::AppState;

/// Fetched NetCDF frame data plus per-layer playback state.
#[derive(Debug, Clone, PartialEq)]
pub struct NetCdfWorking {
    pub frames: NetCdfFrames,
    pub current_index: usize,
    pub opacity: f64,
    pub resampling: Resampling,
    pub name: String,
}

impl NetCdfWorking {
    pub fn new(frames: NetCdfFrames, name: String) -> Self {
        Self {
            frames,
            current_index: 0,
            opacity: 0.75,
            resampling: Resampling::Linear,
            name,
        }
    }
}

/// Global slider range in the sliding dimension's units (typically unix
/// seconds), spanning all visible NetCDF layers.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl AppState {
    /// Caches fetched frame data for a layer. Playback state of an already
    /// known layer is preserved; the frames are fetched once per selection.
    pub fn insert_netcdf_frames(&mut self, id: LayerId, frames: NetCdfFrames, name: String) {
        self.netcdf_working
            .entry(id)
            .or_insert_with(|| NetCdfWorking::new(frames, name));
        self.events.emit(StoreEvent::TimeRangeChanged);
    }

    pub fn remove_netcdf_working(&mut self, id: LayerId) {
        if self.netcdf_working.remove(&id).is_some() {
            self.events.emit(StoreEvent::TimeRangeChanged);
        }
    }

    /// Union of the sliding ranges of all visible NetCDF layers, with the
    /// finest per-frame step. `None` while no visible layer has one.
    pub fn global_time_range(&self) -> Option<TimeRange> {
        let mut range: Option<TimeRange> = None;
        for (id, working) in &self.netcdf_working {
            if !self.is_visible(LayerKey::new(LayerKind::NetCdf, *id)) {
                continue;
            }
            let Some(sliding) = &working.frames.sliding else {
                continue;
            };
            let frames = working.frames.frame_count().max(1);
            let step = (sliding.max - sliding.min) / frames as f64;
            range = Some(match range {
                None => TimeRange {
                    min: sliding.min,
                    max: sliding.max,
                    step,
                },
                Some(existing) => TimeRange {
                    min: existing.min.min(sliding.min),
                    max: existing.max.max(sliding.max),
                    step: existing.step.min(step),
                },
            });
        }
        range
    }
}

#[cfg(test)]
mod tests {
    use catalog::netcdf::NetCdfFrames;
    use foundation::ids::{LayerId, LayerKey, LayerKind};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::AppState;

    fn frames(min: f64, max: f64, count: usize) -> NetCdfFrames {
        serde_json::from_value(json!({
            "netCDFLayer": 1,
            "images": (0..count).map(|i| format!("{i}.png")).collect::<Vec<_>>(),
            "parent_bounds": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]],
            "sliding": {"min": min, "max": max, "step": 1.0, "variable": "time"}
        }))
        .unwrap()
    }

    #[test]
    fn time_range_spans_visible_layers_only() {
        let mut state = AppState::new();
        state.insert_netcdf_frames(LayerId(1), frames(0.0, 100.0, 10), "a".to_string());
        state.insert_netcdf_frames(LayerId(2), frames(50.0, 400.0, 100), "b".to_string());
        assert!(state.global_time_range().is_none());

        state.set_layer_visibility(LayerKey::new(LayerKind::NetCdf, LayerId(1)), true);
        let range = state.global_time_range().unwrap();
        assert_eq!((range.min, range.max, range.step), (0.0, 100.0, 10.0));

        state.set_layer_visibility(LayerKey::new(LayerKind::NetCdf, LayerId(2)), true);
        let range = state.global_time_range().unwrap();
        assert_eq!((range.min, range.max), (0.0, 400.0));
        assert_eq!(range.step, 3.5);
    }

    #[test]
    fn frame_fetch_is_cached_once() {
        let mut state = AppState::new();
        state.insert_netcdf_frames(LayerId(1), frames(0.0, 10.0, 5), "a".to_string());
        state.netcdf_working.get_mut(&LayerId(1)).unwrap().current_index = 3;

        // A second insert for the same layer must not reset playback.
        state.insert_netcdf_frames(LayerId(1), frames(0.0, 10.0, 5), "a".to_string());
        assert_eq!(state.netcdf_working[&LayerId(1)].current_index, 3);
    }
}
