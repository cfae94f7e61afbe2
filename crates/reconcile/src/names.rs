//! Fixed source/sub-layer naming scheme shared by the reconcilers.
//!
//! These names are the join key between reconciliation passes: removal,
//! restyling, and event binding all address render-surface objects through
//! them, so the scheme never varies per call site.

use catalog::style::AnnotationType;
use foundation::ids::LayerId;

pub fn vector_source(id: LayerId) -> String {
    format!("VectorTile_{id}")
}

pub fn vector_sub_layer(id: LayerId, annotation: AnnotationType) -> String {
    format!("Layer_{id}_{annotation}")
}

pub fn raster_source(id: LayerId) -> String {
    format!("RasterTile_{id}")
}

pub fn raster_layer(id: LayerId) -> String {
    format!("Layer_{id}_raster")
}

pub fn netcdf_source(id: LayerId) -> String {
    format!("NetCDFSource_{id}")
}

pub fn netcdf_layer(id: LayerId) -> String {
    format!("NetCDFLayer_{id}")
}

pub fn video_vector_source(id: LayerId) -> String {
    format!("FMVVectorTile_{id}")
}

pub fn video_sub_layer(id: LayerId, annotation: AnnotationType) -> String {
    format!("FMVLayer_{id}_{annotation}")
}

pub fn video_source(id: LayerId) -> String {
    format!("FMVVideoSource_{id}")
}

pub fn video_layer(id: LayerId) -> String {
    format!("FMVLayer_{id}_video")
}

#[cfg(test)]
mod tests {
    use catalog::style::AnnotationType;
    use foundation::ids::LayerId;

    #[test]
    fn sub_layer_names_use_wire_annotation_strings() {
        assert_eq!(
            super::vector_sub_layer(LayerId(7), AnnotationType::FillExtrusion),
            "Layer_7_fill-extrusion"
        );
        assert_eq!(super::raster_layer(LayerId(2)), "Layer_2_raster");
        assert_eq!(
            super::video_sub_layer(LayerId(3), AnnotationType::Circle),
            "FMVLayer_3_circle"
        );
        assert_eq!(super::video_layer(LayerId(3)), "FMVLayer_3_video");
    }
}
