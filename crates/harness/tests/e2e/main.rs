//! End-to-end harness scenarios against a simulated cluster.
//!
//! Every scenario drives the real `Harness` through the `NodeClient`
//! seam; the cluster behind it is an in-process simulation that
//! interprets the same command lines a live cluster would receive.
