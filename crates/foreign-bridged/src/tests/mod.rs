mod bootstrap_behaviour;
mod support;
