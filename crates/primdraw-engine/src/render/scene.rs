use crate::paint::Rgba;

use super::{Drawable, PrimitiveKind, UnknownPrimitiveError};

/// One slot of a scene, in draw order.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEntry {
    Drawable(Drawable),
    /// A tagged descriptor whose kind could not be classified. Kept in place
    /// so that it is reported at its position during the pass.
    Rejected(UnknownPrimitiveError),
}

/// Ordered drawables for one pass. Later entries draw over earlier ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    entries: Vec<SceneEntry>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, drawable: Drawable) -> &mut Self {
        self.entries.push(SceneEntry::Drawable(drawable));
        self
    }

    /// Appends a descriptor identified by its string tag.
    ///
    /// `point_size` is ignored unless the tag is `"point"`. Unknown tags are
    /// kept as rejected entries.
    pub fn push_tagged(
        &mut self,
        tag: &str,
        positions: Vec<[f32; 2]>,
        color: Rgba,
        point_size: Option<f32>,
    ) -> &mut Self {
        let entry = match PrimitiveKind::from_tag(tag) {
            Ok(kind) => {
                let mut drawable = Drawable::new(kind, positions, color);
                if let Some(size) = point_size {
                    drawable = drawable.with_point_size(size);
                }
                SceneEntry::Drawable(drawable)
            }
            Err(error) => {
                log::debug!("scene entry {} rejected: {error}", self.entries.len());
                SceneEntry::Rejected(error)
            }
        };
        self.entries.push(entry);
        self
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Valid drawables with their scene index.
    pub fn drawables(&self) -> impl Iterator<Item = (usize, &Drawable)> {
        self.entries.iter().enumerate().filter_map(|(i, e)| match e {
            SceneEntry::Drawable(d) => Some((i, d)),
            SceneEntry::Rejected(_) => None,
        })
    }
}

impl From<Vec<Drawable>> for Scene {
    fn from(drawables: Vec<Drawable>) -> Self {
        drawables.into_iter().collect()
    }
}

impl FromIterator<Drawable> for Scene {
    fn from_iter<I: IntoIterator<Item = Drawable>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(SceneEntry::Drawable).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_entries_keep_their_position() {
        let mut scene = Scene::new();
        scene
            .push_tagged("triangle", vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]], Rgba::YELLOW, None)
            .push_tagged("circle", vec![[0.0, 0.0]], Rgba::RED, Some(4.0))
            .push_tagged("point", vec![[0.5, 0.5]], Rgba::RED, Some(4.0));

        assert_eq!(scene.len(), 3);
        assert!(matches!(&scene.entries()[1], SceneEntry::Rejected(e) if e.tag == "circle"));
        let indices: Vec<usize> = scene.drawables().map(|(i, _)| i).collect();
        assert_eq!(indices, [0, 2]);
    }

    #[test]
    fn tagged_point_carries_size() {
        let mut scene = Scene::new();
        scene.push_tagged("point", vec![[-1.0, 1.0]], Rgba::RED, Some(15.0));
        let (_, d) = scene.drawables().next().unwrap();
        assert_eq!(d.kind, PrimitiveKind::Point);
        assert_eq!(d.point_size(), 15.0);
    }

    #[test]
    fn collects_from_drawables_in_order() {
        let scene: Scene = vec![
            Drawable::point([0.0, 0.0], Rgba::RED, 2.0),
            Drawable::line(vec![[0.0, 0.0], [1.0, 1.0]], Rgba::GREEN),
        ]
        .into();
        let kinds: Vec<PrimitiveKind> = scene.drawables().map(|(_, d)| d.kind).collect();
        assert_eq!(kinds, [PrimitiveKind::Point, PrimitiveKind::Line]);
    }
}
