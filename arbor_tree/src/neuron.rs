// Copyright 2025 the Arbor Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A reconstructed cell: a soma contour plus its neurites.

use alloc::string::String;
use alloc::vec::Vec;

use arbor_geometry::{DQuat, Point, barycenter};
use glam::DVec3;
use log::debug;

use crate::error::TreeResult;
use crate::neurite::Neurite;
use crate::node::Node;
use crate::types::{NeuriteKind, NeuriteKinds, NeuronSettings};

/// A neuron: soma nodes, neurites and the settings shared by their geometry.
#[derive(Clone, Debug, Default)]
pub struct Neuron {
    name: String,
    soma: Vec<Node>,
    neurites: Vec<Neurite>,
    settings: NeuronSettings,
}

impl Neuron {
    /// Create an empty neuron with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, NeuronSettings::default())
    }

    /// Create an empty neuron with explicit settings.
    pub fn with_settings(name: impl Into<String>, settings: NeuronSettings) -> Self {
        Self {
            name: name.into(),
            soma: Vec::new(),
            neurites: Vec::new(),
            settings,
        }
    }

    /// Name of the neuron.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current settings.
    pub fn settings(&self) -> &NeuronSettings {
        &self.settings
    }

    /// Out-of-plane reference for local bases.
    pub fn up(&self) -> DVec3 {
        self.settings.up
    }

    /// Change the out-of-plane reference.
    ///
    /// Bases already memoized on nodes keep the previous reference.
    pub fn set_up(&mut self, up: DVec3) {
        self.settings.up = up;
    }

    /// Append a soma contour node.
    pub fn add_soma_node(&mut self, node: Node) {
        self.soma.push(node);
    }

    /// Soma contour nodes.
    pub fn soma(&self) -> &[Node] {
        &self.soma
    }

    /// Mean position of the soma nodes, `None` without a soma.
    pub fn soma_barycenter(&self) -> Option<Point> {
        barycenter(self.soma.iter().map(Node::position))
    }

    /// Soma node closest to `point`. Useful to anchor a new neurite with
    /// [`Neurite::set_root_with`].
    pub fn closest_soma_node(&self, point: Point) -> Option<&Node> {
        self.soma
            .iter()
            .min_by(|a, b| a.distance_to_point(point).total_cmp(&b.distance_to_point(point)))
    }

    /// Add a neurite; returns its index.
    pub fn add_neurite(&mut self, neurite: Neurite) -> usize {
        self.neurites.push(neurite);
        self.neurites.len() - 1
    }

    /// All neurites in insertion order.
    pub fn neurites(&self) -> &[Neurite] {
        &self.neurites
    }

    /// All neurites, mutably.
    pub fn neurites_mut(&mut self) -> &mut [Neurite] {
        &mut self.neurites
    }

    /// Neurite with the given id.
    pub fn neurite(&self, id: i64) -> Option<&Neurite> {
        self.neurites.iter().find(|n| n.id() == id)
    }

    /// Neurites whose kind is in `kinds`.
    pub fn neurites_of(&self, kinds: NeuriteKinds) -> impl Iterator<Item = &Neurite> + '_ {
        self.neurites.iter().filter(move |n| kinds.includes(n.kind()))
    }

    /// Axons.
    pub fn axons(&self) -> impl Iterator<Item = &Neurite> + '_ {
        self.neurites.iter().filter(|n| n.kind().is_axon())
    }

    /// Basal dendrites.
    pub fn dendrites(&self) -> impl Iterator<Item = &Neurite> + '_ {
        self.neurites.iter().filter(|n| n.kind().is_dendrite())
    }

    /// Apical dendrites.
    pub fn apicals(&self) -> impl Iterator<Item = &Neurite> + '_ {
        self.neurites.iter().filter(|n| n.kind().is_apical())
    }

    /// Number of neurites of `kind`.
    pub fn count_of(&self, kind: NeuriteKind) -> usize {
        self.neurites.iter().filter(|n| n.kind() == kind).count()
    }

    /// Nodes over all neurites (soma excluded).
    pub fn node_count(&self) -> usize {
        self.neurites.iter().map(Neurite::node_count).sum()
    }

    /// Translate soma and neurites.
    pub fn translate(&mut self, offset: DVec3) -> TreeResult<()> {
        for n in &mut self.soma {
            n.set_position(n.position() + offset);
        }
        self.for_each_rooted(|n| n.translate(offset))
    }

    /// Rotate soma and neurites about the origin.
    pub fn rotate(&mut self, rotation: DQuat) -> TreeResult<()> {
        for n in &mut self.soma {
            n.set_position(rotation * n.position());
        }
        self.for_each_rooted(|n| n.rotate(rotation))
    }

    /// Scale coordinates of soma and neurites component-wise.
    pub fn scale_axes(&mut self, factors: DVec3) -> TreeResult<()> {
        for n in &mut self.soma {
            n.set_position(n.position() * factors);
        }
        self.for_each_rooted(|n| n.scale_axes(factors))
    }

    /// Scale every neurite segment by `r` (see [`Neurite::scale`]).
    ///
    /// The soma contour is scaled by `r` about its barycenter. A soma-anchored
    /// neurite is then translated so its anchor follows the same scaling and
    /// stays on the soma node it was taken from.
    pub fn scale(&mut self, r: f64) -> TreeResult<()> {
        let center = self.soma_barycenter();
        if let Some(center) = center {
            for n in &mut self.soma {
                n.set_position(center + (n.position() - center) * r);
            }
        }
        for neurite in self.neurites.iter_mut().filter(|n| n.is_rooted()) {
            neurite.scale(r)?;
            let Some(center) = center.filter(|_| neurite.root_is_soma()) else {
                continue;
            };
            let root = neurite.root_branch()?;
            if let Ok(anchor) = neurite.branch(root)?.root().map(Node::position) {
                let moved = center + (anchor - center) * r;
                neurite.translate(moved - anchor)?;
            }
        }
        Ok(())
    }

    /// Run [`Neurite::correct`] on every rooted neurite.
    ///
    /// Returns the number of neurites that changed.
    pub fn correct(&mut self) -> TreeResult<usize> {
        let mut changed = 0;
        for n in self.neurites.iter_mut().filter(|n| n.is_rooted()) {
            if n.correct()? {
                changed += 1;
            }
        }
        if changed > 0 {
            debug!("[CORRECT] {}: {} neurites changed", self.name, changed);
        }
        Ok(changed)
    }

    fn for_each_rooted(
        &mut self,
        mut f: impl FnMut(&mut Neurite) -> TreeResult<()>,
    ) -> TreeResult<()> {
        self.neurites
            .iter_mut()
            .filter(|n| n.is_rooted())
            .try_for_each(|n| f(n))
    }
}
