// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Label and annotation keys shared by both reconcilers.
//!
//! The platform keys are owned by the dockyards API; they are mirrored here so
//! the reconcilers and their tests agree on a single spelling.

// ============================================================================
// Platform Labels
// ============================================================================

/// Label carrying the name of the cluster a declaration was derived from.
///
/// Set on zones by the cluster reconciler and read back by the zone reconciler
/// to find the cluster again.
pub const LABEL_CLUSTER_NAME: &str = "dockyards.io/cluster-name";

// ============================================================================
// Platform Annotations
// ============================================================================

/// Annotation that freezes a declaration: reconcilers leave it untouched.
pub const ANNOTATION_SKIP_REMEDIATION: &str = "dockyards.io/skip-remediation";
