//! End-to-end tests driving the full pipeline:
//! tracker -> resolver -> debouncer -> dwell -> commit, across modules.

use approx::assert_relative_eq;
use gaze_core::{
    BoxCollider, Canvas, ColliderSet, ContentItem, DwellPhase, Element, GazePipeline, GridEvent,
    HitResolver, HitTier, PipelineConfig, PlaneMissPolicy, Ray, RearmPolicy, Rect, ResolverConfig,
    SceneConfig, ScriptedTracker, SurfaceFrame, TileId, TrackerFeed, TrackerReading, Vec3,
};
use proptest::prelude::*;

struct Gallery {
    pipeline: GazePipeline,
    feed: TrackerFeed,
    scene: SceneConfig,
}

impl Gallery {
    fn new(config: PipelineConfig) -> Self {
        let items = vec![
            ContentItem::new("Alpine Lakes", "dQw4w9WgXcQ"),
            ContentItem::new("Coral Reef", "aBcDeFgHiJk"),
            ContentItem::new("Night Sky", "zYxWvUtSrQp"),
        ];
        let (tracker, feed) = ScriptedTracker::channel();
        let pipeline = GazePipeline::from_config(Some(Box::new(tracker)), &config, &items);
        Self {
            pipeline,
            feed,
            scene: config.scene,
        }
    }

    fn tile(&self, index: usize) -> TileId {
        self.pipeline.grid().tiles()[index].id()
    }

    fn look_at(&self, index: usize) {
        let cell = self.scene.layout.cells(self.pipeline.grid().len())[index];
        let target = self.scene.surface.to_world(cell.center()).unwrap();
        let eye = self.scene.viewer.eye;
        self.feed.push(TrackerReading {
            tracking: true,
            confidence: 1.0,
            origin: eye,
            direction: target - eye,
        });
    }

    fn look_away(&self) {
        self.feed.push(TrackerReading {
            direction: Vec3::UP,
            ..self.feed.current()
        });
    }

    fn blink(&self) {
        self.feed.push(TrackerReading {
            confidence: 0.2,
            ..self.feed.current()
        });
    }
}

fn default_gallery() -> Gallery {
    Gallery::new(PipelineConfig::default())
}

/// Gaze enters a tile and stays: fill starts at 2 s, commit at 5 s, once.
#[test]
fn steady_gaze_commits_once() {
    let mut g = default_gallery();
    g.look_at(0);
    let entered = g.pipeline.tick(0.5);
    assert_eq!(entered.transition.enter, Some(g.tile(0)));

    let mut fill_at = Vec::new();
    let mut commit_at = Vec::new();
    for k in 1..=20 {
        let t = k as f64 * 0.5;
        let report = g.pipeline.tick(0.5);
        for event in &report.events {
            match event {
                GridEvent::FillStarted { .. } => fill_at.push(t),
                GridEvent::Committed { item, .. } => {
                    assert_eq!(item.media_id, "dQw4w9WgXcQ");
                    commit_at.push(t);
                }
            }
        }
        if k == 7 {
            let indicator = g.pipeline.grid().tiles()[0].indicator();
            assert!(indicator.visible);
            assert_relative_eq!(indicator.amount, 0.5, epsilon = 1e-9);
        }
    }

    assert_eq!(fill_at, vec![2.0]);
    assert_eq!(commit_at, vec![5.0]);
    assert_eq!(g.pipeline.grid().tiles()[0].phase(), DwellPhase::Idle);
    assert!(!g.pipeline.grid().tiles()[0].indicator().visible);
}

/// Leaving mid-fill aborts and hides the indicator; returning starts over.
#[test]
fn look_away_mid_fill_restarts_from_pre_hold() {
    let mut g = default_gallery();
    g.look_at(1);
    g.pipeline.tick(0.0);
    for _ in 0..6 {
        g.pipeline.tick(0.5);
    }
    assert_eq!(g.pipeline.grid().tiles()[1].phase(), DwellPhase::Filling);

    g.look_away();
    let report = g.pipeline.tick(0.5);
    assert_eq!(report.transition.exit, Some(g.tile(1)));
    assert_eq!(report.transition.enter, None);
    let tile = &g.pipeline.grid().tiles()[1];
    assert_eq!(tile.phase(), DwellPhase::Idle);
    assert!(!tile.indicator().visible);
    assert_relative_eq!(tile.indicator().amount, 0.0);

    g.look_at(1);
    g.pipeline.tick(0.0);
    let commits: usize = (0..9).map(|_| g.pipeline.tick(0.5).commits().count()).sum();
    assert_eq!(commits, 0, "4.5 s after returning is not enough");
    assert_eq!(g.pipeline.tick(0.5).commits().count(), 1);
}

/// Leaving during the pre-hold never shows the indicator or commits.
#[test]
fn early_exit_never_shows_indicator() {
    let mut g = default_gallery();
    g.look_at(0);
    g.pipeline.tick(0.0);
    for _ in 0..2 {
        let report = g.pipeline.tick(0.5);
        assert!(report.events.is_empty());
        assert!(!g.pipeline.grid().tiles()[0].indicator().visible);
    }

    g.look_away();
    for _ in 0..20 {
        let report = g.pipeline.tick(0.5);
        assert!(report.events.is_empty());
        assert!(!g.pipeline.grid().tiles()[0].indicator().visible);
    }
    assert_eq!(g.pipeline.grid().tiles()[0].phase(), DwellPhase::Idle);
}

/// Holding on one tile produces a single enter and then silence.
#[test]
fn steady_hover_emits_no_repeat_transitions() {
    let mut g = default_gallery();
    g.look_at(1);
    assert_eq!(g.pipeline.tick(0.1).transition.enter, Some(g.tile(1)));
    for _ in 0..15 {
        assert!(g.pipeline.tick(0.1).transition.is_empty());
    }
}

/// Switching A -> B exits A before B begins; only B dwells afterwards.
#[test]
fn switching_tiles_hands_over_dwell() {
    let mut g = default_gallery();
    g.look_at(0);
    g.pipeline.tick(0.0);
    g.pipeline.tick(1.5);

    g.look_at(2);
    let report = g.pipeline.tick(0.5);
    assert_eq!(report.transition.exit, Some(g.tile(0)));
    assert_eq!(report.transition.enter, Some(g.tile(2)));
    assert_eq!(g.pipeline.grid().tiles()[0].phase(), DwellPhase::Idle);
    assert_eq!(g.pipeline.grid().tiles()[2].phase(), DwellPhase::PreHold);
    assert_eq!(g.pipeline.grid().active_dwell_count(), 1);
    assert_eq!(g.pipeline.current_tile(), Some(g.tile(2)));
}

/// A low-confidence frame counts as no tile and cancels the dwell.
#[test]
fn blink_cancels_dwell() {
    let mut g = default_gallery();
    g.look_at(0);
    g.pipeline.tick(0.0);
    for _ in 0..8 {
        g.pipeline.tick(0.5);
    }
    assert_eq!(g.pipeline.grid().tiles()[0].phase(), DwellPhase::Filling);

    g.blink();
    let report = g.pipeline.tick(0.5);
    assert!(!report.sample.valid);
    assert_eq!(report.resolution.tile, None);
    assert_eq!(report.transition.exit, Some(g.tile(0)));
    assert_eq!(g.pipeline.grid().active_dwell_count(), 0);
}

/// Staying on a tile under auto-restart commits every 5 s.
#[test]
fn auto_restart_commits_repeatedly() {
    let mut config = PipelineConfig::default();
    config.dwell.rearm = RearmPolicy::AutoRestart;
    let mut g = Gallery::new(config);
    g.look_at(0);
    g.pipeline.tick(0.0);

    let mut commit_at = Vec::new();
    for k in 1..=24 {
        if g.pipeline.tick(0.5).commits().count() > 0 {
            commit_at.push(k as f64 * 0.5);
        }
    }
    assert_eq!(commit_at, vec![5.0, 10.0]);
}

/// Gaze in the gutter between tiles selects nothing.
#[test]
fn gutter_selects_nothing() {
    let mut g = default_gallery();
    let cells = g.scene.layout.cells(3);
    let gap = (cells[0].max.x + cells[1].min.x) * 0.5;
    let target = g
        .scene
        .surface
        .to_world(gaze_core::Vec2::new(gap, cells[0].center().y))
        .unwrap();
    g.feed.push(TrackerReading {
        tracking: true,
        confidence: 1.0,
        origin: g.scene.viewer.eye,
        direction: target - g.scene.viewer.eye,
    });
    let report = g.pipeline.tick(0.5);
    assert_eq!(report.resolution.tile, None);
    assert_eq!(report.resolution.tier, Some(HitTier::Surface));
}

fn panel_over_collider(policy: PlaneMissPolicy) -> (HitResolver, TileId) {
    let tile = TileId::new();
    let mut canvas = Canvas::new(SurfaceFrame::default());
    canvas.add(Element::new("panel", Rect::from_origin_size(-500.0, -500.0, 1000.0, 1000.0)));
    let mut colliders = ColliderSet::new();
    colliders.add(
        BoxCollider::axis_aligned(Vec3::new(0.0, 1.5, 3.0), Vec3::new(0.5, 0.5, 0.1))
            .trigger()
            .owned_by(tile),
    );
    let resolver = HitResolver::new(ResolverConfig {
        plane_miss: policy,
        ..ResolverConfig::default()
    })
    .with_surface(Box::new(canvas))
    .with_collision_world(Box::new(colliders));
    (resolver, tile)
}

#[test]
fn plane_hit_without_tile_absorbs_by_default() {
    let (mut resolver, _) = panel_over_collider(PlaneMissPolicy::Absorb);
    let ray = Ray::new(Vec3::new(0.0, 1.5, 0.0), Vec3::FORWARD).unwrap();
    let res = resolver.resolve(&ray, 10.0);
    assert_eq!(res.tile, None);
    assert_eq!(res.tier, Some(HitTier::Surface));
}

#[test]
fn plane_hit_without_tile_can_fall_through() {
    let (mut resolver, tile) = panel_over_collider(PlaneMissPolicy::FallThrough);
    let ray = Ray::new(Vec3::new(0.0, 1.5, 0.0), Vec3::FORWARD).unwrap();
    let res = resolver.resolve(&ray, 10.0);
    assert_eq!(res.tile, Some(tile));
    assert_eq!(res.tier, Some(HitTier::Volume));
}

proptest! {
    /// Under any gaze script at most one tile dwells, and every commit is
    /// preceded by at least pre-hold + fill seconds of unbroken gaze.
    #[test]
    fn dwell_is_exclusive_and_continuous(
        steps in prop::collection::vec((prop::option::of(0usize..3), 0.0f64..1.5), 1..200),
    ) {
        let mut g = default_gallery();
        let mut continuous = 0.0;
        let mut commits_this_visit = 0;

        for (target, dt) in steps {
            match target {
                Some(i) => g.look_at(i),
                None => g.look_away(),
            }
            let report = g.pipeline.tick(dt);
            prop_assert!(g.pipeline.grid().active_dwell_count() <= 1);

            if report.transition.enter.is_some() || g.pipeline.current_tile().is_none() {
                continuous = 0.0;
                commits_this_visit = 0;
            } else {
                continuous += dt;
            }

            for item in report.commits() {
                let current = g.pipeline.current_tile();
                prop_assert!(current.is_some());
                let expected = &g.pipeline.grid().get(current.unwrap()).unwrap().content().media_id;
                prop_assert_eq!(&item.media_id, expected);
                prop_assert!(continuous >= 5.0 - 1e-6, "committed after {continuous} s");
                commits_this_visit += 1;
            }
            prop_assert!(commits_this_visit <= 1);
        }
    }
}
