//! Integration tests for Layer 1: Astro
//!
//! Tests for solar events, horizons and proportional hours.

mod proportional;
